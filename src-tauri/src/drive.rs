//! Envio do backup JSON para uma pasta do Google Drive.
//!
//! O token é o JSON gravado pelas bibliotecas de autenticação do Google
//! (`token`/`access_token`, `refresh_token`, `client_id`, `client_secret`).
//! Sem token ou sem pasta configurada o envio é ignorado.

use crate::backup::{default_backup_path, save_backup};
use crate::db::Database;
use crate::error::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const FILES_URL: &str = "https://www.googleapis.com/drive/v3/files";
const UPLOAD_URL: &str = "https://www.googleapis.com/upload/drive/v3/files";
const BOUNDARY: &str = "calhagest_backup_boundary";

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GoogleToken {
    #[serde(alias = "access_token", default)]
    pub token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub client_secret: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct FileList {
    #[serde(default)]
    files: Vec<DriveFile>,
}

#[derive(Debug, Deserialize)]
struct DriveFile {
    id: String,
}

/// Aceita `.../folders/ID`, `?id=ID`/`&id=ID` ou o ID puro (10+ caracteres)
pub fn extract_folder_id(link: &str) -> Option<String> {
    let link = link.trim();
    if link.is_empty() {
        return None;
    }

    for pattern in [r"/folders/([A-Za-z0-9_-]+)", r"[?&]id=([A-Za-z0-9_-]+)"] {
        let re = regex::Regex::new(pattern).ok()?;
        if let Some(caps) = re.captures(link) {
            return Some(caps[1].to_string());
        }
    }

    let bare = regex::Regex::new(r"^[A-Za-z0-9_-]{10,}$").ok()?;
    bare.is_match(link).then(|| link.to_string())
}

/// `None` quando o arquivo de token não existe
pub fn load_token(path: &Path) -> AppResult<Option<GoogleToken>> {
    if !path.exists() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(path)?;
    let token: GoogleToken = serde_json::from_str(&content)
        .map_err(|e| AppError::Drive(format!("Token do Google Drive inválido: {}", e)))?;
    Ok(Some(token))
}

fn http_client() -> AppResult<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(30))
        .build()
        .map_err(|e| AppError::Drive(format!("Erro criando cliente HTTP: {}", e)))
}

/// Renova o access token. Sem refresh token usa o token gravado.
async fn access_token(client: &reqwest::Client, token: &GoogleToken) -> AppResult<String> {
    let (Some(refresh), Some(client_id), Some(client_secret)) =
        (&token.refresh_token, &token.client_id, &token.client_secret)
    else {
        return token
            .token
            .clone()
            .ok_or_else(|| AppError::Drive("Token do Google Drive sem credenciais".to_string()));
    };

    let resp = client
        .post(&token.token_uri)
        .form(&[
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh.as_str()),
            ("client_id", client_id.as_str()),
            ("client_secret", client_secret.as_str()),
        ])
        .send()
        .await?;

    if !resp.status().is_success() {
        return Err(AppError::Drive(format!(
            "Falha ao renovar token do Google (HTTP {})",
            resp.status()
        )));
    }
    let data: RefreshResponse = resp.json().await?;
    Ok(data.access_token)
}

/// Corpo multipart/related: metadados JSON seguidos do conteúdo
fn multipart_body(metadata: &serde_json::Value, content: &[u8]) -> Vec<u8> {
    let mut body = Vec::with_capacity(content.len() + 512);
    body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
    body.extend_from_slice(b"Content-Type: application/json; charset=UTF-8\r\n\r\n");
    body.extend_from_slice(metadata.to_string().as_bytes());
    body.extend_from_slice(format!("\r\n--{}\r\n", BOUNDARY).as_bytes());
    body.extend_from_slice(b"Content-Type: application/json\r\n\r\n");
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());
    body
}

async fn find_existing(
    client: &reqwest::Client,
    access: &str,
    folder_id: &str,
    filename: &str,
) -> AppResult<Option<String>> {
    let query = format!(
        "name='{}' and '{}' in parents and trashed=false",
        filename.replace('\'', "\\'"),
        folder_id
    );
    let resp = client
        .get(FILES_URL)
        .bearer_auth(access)
        .query(&[
            ("q", query.as_str()),
            ("spaces", "drive"),
            ("fields", "files(id, name)"),
            ("pageSize", "1"),
        ])
        .send()
        .await?;

    if !resp.status().is_success() {
        return Ok(None);
    }
    let list: FileList = resp.json().await?;
    Ok(list.files.into_iter().next().map(|f| f.id))
}

/// Envia o arquivo para a pasta, substituindo um de mesmo nome.
/// Retorna o id do arquivo no Drive.
pub async fn upload_file(token: &GoogleToken, folder_id: &str, path: &Path) -> AppResult<String> {
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| AppError::Drive("Caminho do backup inválido".to_string()))?;
    let content = std::fs::read(path)?;

    let client = http_client()?;
    let access = access_token(&client, token).await?;
    let existing = find_existing(&client, &access, folder_id, &filename).await?;

    let request = match &existing {
        Some(id) => client
            .patch(format!("{}/{}", UPLOAD_URL, id))
            .body(multipart_body(&serde_json::json!({ "name": filename }), &content)),
        None => client.post(UPLOAD_URL).body(multipart_body(
            &serde_json::json!({ "name": filename, "parents": [folder_id] }),
            &content,
        )),
    };

    let resp = request
        .bearer_auth(&access)
        .query(&[("uploadType", "multipart"), ("fields", "id")])
        .header(
            reqwest::header::CONTENT_TYPE,
            format!("multipart/related; boundary={}", BOUNDARY),
        )
        .send()
        .await?;

    if !resp.status().is_success() {
        return Err(AppError::Drive(format!(
            "Falha no envio para o Google Drive (HTTP {})",
            resp.status()
        )));
    }
    let file: DriveFile = resp.json().await?;
    Ok(file.id)
}

/// Pasta e token configurados, ou `None` quando falta algum
fn drive_target(db: &Database) -> AppResult<Option<(String, GoogleToken)>> {
    let settings = db.get_settings()?;
    let Some(folder_id) = settings.drive_folder_link.as_deref().and_then(extract_folder_id) else {
        log::info!("Google Drive sem pasta configurada; envio ignorado");
        return Ok(None);
    };
    let Some(token) = load_token(&db.config.drive_token_path)? else {
        log::info!("Google Drive sem token em {}", db.config.drive_token_path.display());
        return Ok(None);
    };
    Ok(Some((folder_id, token)))
}

/// Envia o backup atual (gerado se ainda não existir).
/// `Ok(None)` quando não há pasta ou token configurados.
pub async fn upload_backup_to_drive(db: &Database) -> AppResult<Option<String>> {
    let Some((folder_id, token)) = drive_target(db)? else {
        return Ok(None);
    };

    let path = default_backup_path(db)?;
    let path = if path.exists() { path } else { save_backup(db)? };

    let id = upload_file(&token, &folder_id, &path).await?;
    log::info!("Backup enviado ao Google Drive ({})", id);
    Ok(Some(id))
}

/// Envio sem propagar erro
pub async fn sync_backup(db: &Database) -> bool {
    match upload_backup_to_drive(db).await {
        Ok(id) => id.is_some(),
        Err(e) => {
            log::warn!("Falha ao enviar backup ao Google Drive: {}", e);
            false
        }
    }
}

/// Confere se a pasta configurada é acessível com o token atual
pub async fn test_drive_connection(db: &Database) -> AppResult<bool> {
    let Some((folder_id, token)) = drive_target(db)? else {
        return Ok(false);
    };

    let client = http_client()?;
    let access = access_token(&client, &token).await?;
    let resp = client
        .get(format!("{}/{}", FILES_URL, folder_id))
        .bearer_auth(&access)
        .query(&[("fields", "id, name")])
        .send()
        .await?;
    Ok(resp.status().is_success())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::models::SettingsUpdate;

    #[test]
    fn test_extrai_id_da_pasta() {
        assert_eq!(
            extract_folder_id("https://drive.google.com/drive/folders/1AbC_dEf-234?usp=sharing").as_deref(),
            Some("1AbC_dEf-234")
        );
        assert_eq!(
            extract_folder_id("https://drive.google.com/open?id=XyZ987654321").as_deref(),
            Some("XyZ987654321")
        );
        assert_eq!(
            extract_folder_id("https://drive.google.com/open?usp=x&id=abc_DEF-12").as_deref(),
            Some("abc_DEF-12")
        );
        assert_eq!(extract_folder_id("  0B1234567890  ").as_deref(), Some("0B1234567890"));
        assert_eq!(extract_folder_id("curto"), None);
        assert_eq!(extract_folder_id("https://example.com/pasta"), None);
        assert_eq!(extract_folder_id(""), None);
    }

    #[test]
    fn test_le_token() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("token.json");
        assert!(load_token(&path).unwrap().is_none());

        std::fs::write(
            &path,
            r#"{"access_token": "ya29.a", "refresh_token": "1//r", "client_id": "id", "client_secret": "s"}"#,
        )
        .unwrap();
        let token = load_token(&path).unwrap().unwrap();
        assert_eq!(token.token.as_deref(), Some("ya29.a"));
        assert_eq!(token.token_uri, DEFAULT_TOKEN_URI);

        std::fs::write(&path, "não é json").unwrap();
        assert!(matches!(load_token(&path), Err(AppError::Drive(_))));
    }

    #[test]
    fn test_corpo_multipart() {
        let body = multipart_body(&serde_json::json!({ "name": "b.json" }), b"{}");
        let text = String::from_utf8(body).unwrap();
        assert!(text.starts_with(&format!("--{}\r\n", BOUNDARY)));
        assert!(text.contains(r#"{"name":"b.json"}"#));
        assert!(text.ends_with(&format!("\r\n{{}}\r\n--{}--\r\n", BOUNDARY)));
    }

    #[tokio::test]
    async fn test_ignora_sem_configuracao() {
        let tmp = tempfile::tempdir().unwrap();
        let db = Database::in_memory_with(AppConfig::in_dir(tmp.path())).unwrap();
        assert_eq!(upload_backup_to_drive(&db).await.unwrap(), None);

        db.update_settings(&SettingsUpdate {
            drive_folder_link: Some("https://drive.google.com/drive/folders/1AbCdEfGhIj".into()),
            ..Default::default()
        })
        .unwrap();
        // Pasta configurada mas sem token
        assert_eq!(upload_backup_to_drive(&db).await.unwrap(), None);
        assert!(!sync_backup(&db).await);
        assert!(!test_drive_connection(&db).await.unwrap());
    }
}
