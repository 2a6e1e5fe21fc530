use serde::Deserialize;
use serde::Serialize;
use strum::EnumIter;
use strum::EnumVariantNames;
use strum::IntoEnumIterator;

pub const BOX_ROOT_FOLDER_ID: &str = "0";

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, EnumIter, EnumVariantNames, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum ExternalProvider {
    Google,
    Box,
}

impl ExternalProvider {
    pub fn parse(text: &str) -> Option<ExternalProvider> {
        return ExternalProvider::iter().find(|e| return e.to_string() == text);
    }

    /// Google addresses its root by omitting the folder, Box by the id `0`.
    pub fn root_folder_id(&self) -> Option<String> {
        return match self {
            ExternalProvider::Google => None,
            ExternalProvider::Box => Some(BOX_ROOT_FOLDER_ID.to_string()),
        };
    }

    pub fn display_name(&self) -> &'static str {
        return match self {
            ExternalProvider::Google => "Google Drive",
            ExternalProvider::Box => "Box",
        };
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExternalFileType {
    File,
    Folder,
    WebLink,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalFile {
    pub id: String,
    #[serde(rename = "type")]
    pub file_type: ExternalFileType,
    pub name: String,
    #[serde(default)]
    pub mime_type: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalFileList {
    pub files: Vec<ExternalFile>,
}
