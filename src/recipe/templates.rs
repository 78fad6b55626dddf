//! Dockerfile templates, one per recipe family.

/// Multi-stage Maven build: the builder stage produces the jar, the runtime
/// stage ships only the jar on a JRE base.
pub fn maven(java_version: &str, port: u16) -> String {
    format!(
        r#"# Build stage
FROM maven:3.9-eclipse-temurin-{java_version} AS builder

WORKDIR /app

# Resolve dependencies before copying sources so they stay cached
COPY pom.xml .
RUN mvn dependency:go-offline -B

COPY src ./src
RUN mvn clean package -DskipTests -B

# Runtime stage
FROM eclipse-temurin:{java_version}-jre

WORKDIR /app

COPY --from=builder /app/target/*.jar app.jar

EXPOSE {port}

ENV JAVA_OPTS="-Xms256m -Xmx512m"

ENTRYPOINT ["sh", "-c", "java $JAVA_OPTS -jar app.jar"]
"#
    )
}

pub fn node(port: u16) -> String {
    format!(
        r#"FROM node:18-alpine

WORKDIR /app

COPY package*.json ./
RUN npm install

COPY . .

EXPOSE {port}

CMD ["npm", "start"]
"#
    )
}

pub fn python(port: u16) -> String {
    format!(
        r#"FROM python:3.11-slim

WORKDIR /app

COPY requirements.txt .
RUN pip install --no-cache-dir -r requirements.txt

COPY . .

EXPOSE {port}

CMD ["python", "app.py"]
"#
    )
}

/// Build-context exclusions. Independent of the detected stack.
pub const EXCLUSION_LIST: &str = r#"# Build output
target/

# Editor state
.idea/
*.iml
.vscode/
*.swp
*.swo

# Version control
.git/
.gitignore

# Logs
*.log
logs/

# OS files
.DS_Store
Thumbs.db

# Local environment overrides
.env.local
.env.*.local

# Generated deployment files
Dockerfile
docker-compose.yml
.dockerignore
"#;
