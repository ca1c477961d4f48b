use std::path::PathBuf;

/// Pasta usada em Documentos e em AppData
const APP_DIR: &str = "CalhaGest";
pub const DB_FILENAME: &str = "calhagest.db";

/// Caminhos e opções de execução. As configurações do negócio
/// (empresa, valor da dobra, pasta de backup) ficam na tabela `settings`.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub db_path: PathBuf,
    /// Usado quando `settings.backup_path` está vazio
    pub default_backup_dir: PathBuf,
    pub pdf_dir: PathBuf,
    pub charts_dir: PathBuf,
    pub fonts_dir: PathBuf,
    pub drive_token_path: PathBuf,
    /// Backup JSON após cada alteração
    pub auto_backup: bool,
}

impl AppConfig {
    /// Lê as variáveis `CALHAGEST_*`, com padrões vindos do diretório do usuário.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let data_dir = var("CALHAGEST_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(default_data_dir);

        let db_path = var("CALHAGEST_DB")
            .map(PathBuf::from)
            .unwrap_or_else(|| data_dir.join(DB_FILENAME));

        let default_backup_dir = var("CALHAGEST_BACKUP_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(default_backup_dir);

        let fonts_dir = var("CALHAGEST_FONTS_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fonts"));

        let auto_backup = var("CALHAGEST_AUTO_BACKUP")
            .map(|v| !matches!(v.trim().to_lowercase().as_str(), "0" | "false" | "no" | "nao"))
            .unwrap_or(true);

        AppConfig {
            pdf_dir: data_dir.join("pdfs"),
            charts_dir: data_dir.join("charts"),
            drive_token_path: data_dir.join("token.json"),
            data_dir,
            db_path,
            default_backup_dir,
            fonts_dir,
            auto_backup,
        }
    }

    /// Configuração isolada em uma pasta, sem backup automático. Usada nos testes.
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        AppConfig {
            db_path: dir.join(DB_FILENAME),
            default_backup_dir: dir.join("backup"),
            pdf_dir: dir.join("pdfs"),
            charts_dir: dir.join("charts"),
            fonts_dir: PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fonts"),
            drive_token_path: dir.join("token.json"),
            data_dir: dir,
            auto_backup: false,
        }
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}

fn default_backup_dir() -> PathBuf {
    dirs::document_dir()
        .or_else(|| dirs::home_dir().map(|h| h.join("Documents")))
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}
