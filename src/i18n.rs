use serde::{Deserialize, Serialize};

/// 报告目标语言
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
pub enum TargetLanguage {
    #[serde(rename = "en")]
    #[default]
    English,
    #[serde(rename = "fr")]
    French,
    #[serde(rename = "de")]
    German,
    #[serde(rename = "es")]
    Spanish,
    #[serde(rename = "zh")]
    Chinese,
}

impl std::fmt::Display for TargetLanguage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TargetLanguage::English => write!(f, "en"),
            TargetLanguage::French => write!(f, "fr"),
            TargetLanguage::German => write!(f, "de"),
            TargetLanguage::Spanish => write!(f, "es"),
            TargetLanguage::Chinese => write!(f, "zh"),
        }
    }
}

impl std::str::FromStr for TargetLanguage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "en" | "english" => Ok(TargetLanguage::English),
            "fr" | "french" | "français" => Ok(TargetLanguage::French),
            "de" | "german" | "deutsch" => Ok(TargetLanguage::German),
            "es" | "spanish" | "español" => Ok(TargetLanguage::Spanish),
            "zh" | "chinese" | "中文" => Ok(TargetLanguage::Chinese),
            _ => Err(format!("Unknown target language: {}", s)),
        }
    }
}

impl TargetLanguage {
    /// 追加在每个agent系统提示词末尾的语言指令
    pub fn prompt_instruction(&self) -> &'static str {
        match self {
            TargetLanguage::English => {
                "Write every deliverable in English, in a precise, professional and accessible tone."
            }
            TargetLanguage::French => {
                "Rédigez chaque livrable en français, dans un style précis, professionnel et accessible."
            }
            TargetLanguage::German => {
                "Verfassen Sie alle Ergebnisse auf Deutsch, präzise, professionell und leicht verständlich."
            }
            TargetLanguage::Spanish => {
                "Redacte cada entregable en español, con un estilo preciso, profesional y accesible."
            }
            TargetLanguage::Chinese => "请使用中文撰写所有产出，确保表达准确、专业、易于理解。",
        }
    }

    /// 下载文件名前缀
    pub fn report_file_prefix(&self) -> &'static str {
        match self {
            TargetLanguage::English => "analysis_report",
            TargetLanguage::French => "rapport_analyse",
            TargetLanguage::German => "analysebericht",
            TargetLanguage::Spanish => "informe_analisis",
            TargetLanguage::Chinese => "analysis_report",
        }
    }

    /// 输入缺失时展示给用户的提示
    pub fn missing_input_warning(&self) -> &'static str {
        match self {
            TargetLanguage::English => "Please enter a main topic and sub-topics.",
            TargetLanguage::French => "Veuillez saisir un sujet principal et des sous-thèmes.",
            TargetLanguage::German => "Bitte geben Sie ein Hauptthema und Unterthemen ein.",
            TargetLanguage::Spanish => "Introduzca un tema principal y subtemas.",
            TargetLanguage::Chinese => "请输入主题和子主题。",
        }
    }
}
