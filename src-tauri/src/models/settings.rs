use serde::{Deserialize, Serialize};

pub const DEFAULT_DOBRA_VALUE: f64 = 5.0;

/// Linha única da tabela `settings`. O logo fica fora; ver `has_logo`.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Settings {
    pub company_name: String,
    pub company_phone: String,
    pub company_email: String,
    pub company_address: String,
    pub company_cnpj: String,
    pub has_logo: bool,
    pub dobra_value: f64,
    pub backup_path: Option<String>,
    pub drive_folder_link: Option<String>,
    pub updated_at: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            company_name: "CalhaGest".to_string(),
            company_phone: String::new(),
            company_email: String::new(),
            company_address: String::new(),
            company_cnpj: String::new(),
            has_logo: false,
            dobra_value: DEFAULT_DOBRA_VALUE,
            backup_path: None,
            drive_folder_link: None,
            updated_at: None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct SettingsUpdate {
    pub company_name: Option<String>,
    pub company_phone: Option<String>,
    pub company_email: Option<String>,
    pub company_address: Option<String>,
    pub company_cnpj: Option<String>,
    pub dobra_value: Option<f64>,
    pub backup_path: Option<String>,
    pub drive_folder_link: Option<String>,
}
