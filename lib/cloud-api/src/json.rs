//! Wire shapes for the drive item / delta feed surface, following the
//! `$select=id,name,root,file,folder,parentReference` fields the collaborator
//! asks for.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct DriveItem {
    pub id: String,
    pub name: Option<String>,
    #[serde(rename = "parentReference")]
    pub parent_reference: Option<ParentReference>,
    pub file: Option<FileFacet>,
    pub folder: Option<FolderFacet>,
    pub root: Option<serde_json::Value>,
    pub deleted: Option<serde_json::Value>,
    pub size: Option<u64>,
    #[serde(rename = "eTag")]
    pub e_tag: Option<String>,
    #[serde(rename = "cTag")]
    pub c_tag: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ParentReference {
    pub id: String,
}

#[derive(Debug, Deserialize)]
pub struct FileFacet {
    pub hashes: Option<BTreeMap<String, String>>,
}

#[derive(Debug, Deserialize)]
pub struct FolderFacet {
    #[serde(rename = "childCount")]
    #[allow(dead_code)]
    pub child_count: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct DeltaPage {
    pub value: Vec<DriveItem>,
    #[serde(rename = "@odata.nextLink")]
    pub next_link: Option<String>,
    #[serde(rename = "@odata.deltaLink")]
    pub delta_link: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CreateDirBody<'a> {
    pub name: &'a str,
    pub folder: serde_json::Value,
}

#[derive(Debug, Serialize, Default)]
pub struct MoveRenameBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<&'a str>,
    #[serde(rename = "parentReference", skip_serializing_if = "Option::is_none")]
    pub parent_reference: Option<ParentReferenceRef<'a>>,
}

#[derive(Debug, Serialize)]
pub struct ParentReferenceRef<'a> {
    pub id: &'a str,
}

#[derive(Debug, Serialize)]
pub struct UploadSessionBody {
    pub item: UploadSessionItem,
}

#[derive(Debug, Serialize)]
pub struct UploadSessionItem {
    #[serde(rename = "@microsoft.graph.conflictBehavior")]
    pub conflict_behavior: &'static str,
}

#[derive(Debug, Deserialize)]
pub struct UploadSession {
    #[serde(rename = "uploadUrl")]
    pub upload_url: String,
}
