use std::collections::BTreeMap;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use recon_apply::{CloudCollaborator, DeltaItem};
use recon_model::{CloudFile, Digests, Id};

use crate::error::{generr, inerr, CloudError};
use crate::json::{
    CreateDirBody, DeltaPage, DriveItem, MoveRenameBody, ParentReferenceRef, UploadSession,
    UploadSessionBody, UploadSessionItem,
};

const GRAPH_ENDPOINT: &str = "https://graph.microsoft.com/v1.0/me/drive";
const UPLOAD_CHUNK_SIZE: usize = 320 * 1024;

/// Talks to a Microsoft-Graph-shaped drive API. Holds no retry/backoff
/// policy of its own; the caller decides how to react to a failed request.
pub struct GraphClient {
    client: Client,
    token: String,
}

impl GraphClient {
    pub fn new(client: Client, token: impl ToString) -> GraphClient {
        GraphClient {
            client,
            token: token.to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{GRAPH_ENDPOINT}{path}")
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
        src: &str,
    ) -> Result<T, CloudError> {
        let response = request
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(inerr(src))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CloudError::Status {
                src: src.to_string(),
                status: status.as_u16(),
                body,
            });
        }
        response.json::<T>().await.map_err(inerr(src))
    }

    async fn send_ok(&self, request: reqwest::RequestBuilder, src: &str) -> Result<(), CloudError> {
        let response = request
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(inerr(src))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CloudError::Status {
                src: src.to_string(),
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }

    /// Uploads `content` (`size` bytes) to an already-opened upload session
    /// in `UPLOAD_CHUNK_SIZE` units, per the resumable-upload protocol.
    /// Returns the drive item the cloud reports once the final chunk lands.
    async fn upload_chunked(
        &self,
        upload_url: &str,
        content: &mut (dyn AsyncRead + Unpin + Send),
        size: u64,
    ) -> Result<DriveItem, CloudError> {
        let mut sent: u64 = 0;
        let mut buf = vec![0u8; UPLOAD_CHUNK_SIZE];
        loop {
            let mut filled = 0;
            while filled < buf.len() {
                let n = content
                    .read(&mut buf[filled..])
                    .await
                    .map_err(|err| generr("upload_chunked", err))?;
                if n == 0 {
                    break;
                }
                filled += n;
            }
            if filled == 0 {
                break;
            }
            let chunk = buf[..filled].to_vec();
            let start = sent;
            let end = sent + filled as u64 - 1;
            let response = self
                .client
                .put(upload_url)
                .header("Content-Length", filled.to_string())
                .header("Content-Range", format!("bytes {start}-{end}/{size}"))
                .body(chunk)
                .send()
                .await
                .map_err(inerr("upload_chunked"))?;
            let status = response.status();
            sent += filled as u64;
            if sent >= size {
                if !status.is_success() {
                    let body = response.text().await.unwrap_or_default();
                    return Err(CloudError::Status {
                        src: "upload_chunked".into(),
                        status: status.as_u16(),
                        body,
                    });
                }
                return response
                    .json::<DriveItem>()
                    .await
                    .map_err(inerr("upload_chunked"));
            }
            if status != StatusCode::ACCEPTED && !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(CloudError::Status {
                    src: "upload_chunked".into(),
                    status: status.as_u16(),
                    body,
                });
            }
        }
        Err(generr(
            "upload_chunked",
            "content ended before declared size",
        ))
    }
}

fn drive_item_to_cloud_file(item: DriveItem, fallback_parent: &Id) -> CloudFile {
    let hashes: Digests = item
        .file
        .and_then(|f| f.hashes)
        .unwrap_or_default()
        .into_iter()
        .map(|(k, v)| (k, v.to_uppercase()))
        .collect();
    CloudFile {
        id: Id::real(item.id),
        name: item.name.unwrap_or_default(),
        parent: item
            .parent_reference
            .map(|p| Id::real(p.id))
            .unwrap_or_else(|| fallback_parent.clone()),
        size: item.size.unwrap_or(0),
        e_tag: item.e_tag.unwrap_or_default(),
        c_tag: item.c_tag.unwrap_or_default(),
        hashes,
    }
}

#[async_trait]
impl CloudCollaborator for GraphClient {
    type Error = CloudError;

    async fn delta(
        &self,
        root_id: &Id,
        delta_token: Option<&str>,
    ) -> Result<(Vec<DeltaItem>, String), Self::Error> {
        let mut url = match delta_token {
            Some(token) => token.to_string(),
            None => self.url(&format!(
                "/items/{}/delta?$select=id,name,root,file,folder,parentReference,deleted,size,eTag,cTag",
                root_id.as_str()
            )),
        };

        // Later occurrences of the same id override earlier ones within a
        // page, matching the cloud's own "last write in the feed wins"
        // semantics; `order` keeps first-seen order stable across pages.
        let mut items: BTreeMap<String, DriveItem> = BTreeMap::new();
        let mut order: Vec<String> = Vec::new();
        let final_token = loop {
            let page: DeltaPage = self
                .send_json(self.client.get(&url), "retrieve_delta")
                .await?;
            for item in page.value {
                if !items.contains_key(&item.id) {
                    order.push(item.id.clone());
                }
                items.insert(item.id.clone(), item);
            }
            if let Some(next) = page.next_link {
                url = next;
                continue;
            }
            if let Some(delta) = page.delta_link {
                break delta;
            }
            return Err(CloudError::DeltaFeedTruncated);
        };

        let delta_items = order
            .into_iter()
            .filter_map(|id| items.remove(&id))
            .map(|item| {
                if item.deleted.is_some() {
                    DeltaItem::Deleted {
                        id: Id::real(item.id),
                    }
                } else if item.folder.is_some() {
                    DeltaItem::Folder {
                        id: Id::real(item.id.clone()),
                        parent_id: item
                            .parent_reference
                            .map(|p| Id::real(p.id))
                            .unwrap_or_else(|| root_id.clone()),
                        name: item.name.unwrap_or_default(),
                    }
                } else {
                    let hashes: Digests = item
                        .file
                        .and_then(|f| f.hashes)
                        .unwrap_or_default()
                        .into_iter()
                        .map(|(k, v)| (k, v.to_uppercase()))
                        .collect();
                    DeltaItem::File {
                        id: Id::real(item.id.clone()),
                        parent_id: item
                            .parent_reference
                            .map(|p| Id::real(p.id))
                            .unwrap_or_else(|| root_id.clone()),
                        name: item.name.unwrap_or_default(),
                        size: item.size.unwrap_or(0),
                        e_tag: item.e_tag.unwrap_or_default(),
                        c_tag: item.c_tag.unwrap_or_default(),
                        hashes,
                    }
                }
            })
            .collect();

        Ok((delta_items, final_token))
    }

    async fn create_dir(&self, parent: &Id, name: &str) -> Result<Id, Self::Error> {
        let body = CreateDirBody {
            name,
            folder: serde_json::json!({}),
        };
        let item: DriveItem = self
            .send_json(
                self.client
                    .post(self.url(&format!("/items/{}/children", parent.as_str())))
                    .json(&body),
                "create_dir",
            )
            .await?;
        Ok(Id::real(item.id))
    }

    async fn create_file(
        &self,
        parent: &Id,
        name: &str,
        content: &mut (dyn AsyncRead + Unpin + Send),
        size: u64,
    ) -> Result<CloudFile, Self::Error> {
        let session: UploadSession = self
            .send_json(
                self.client
                    .post(self.url(&format!(
                        "/items/{}:/{}:/createUploadSession",
                        parent.as_str(),
                        name
                    )))
                    .json(&UploadSessionBody {
                        item: UploadSessionItem {
                            conflict_behavior: "fail",
                        },
                    }),
                "create_file",
            )
            .await?;
        let item = self
            .upload_chunked(&session.upload_url, content, size)
            .await?;
        Ok(drive_item_to_cloud_file(item, parent))
    }

    async fn upload(
        &self,
        id: &Id,
        content: &mut (dyn AsyncRead + Unpin + Send),
        size: u64,
    ) -> Result<CloudFile, Self::Error> {
        let session: UploadSession = self
            .send_json(
                self.client
                    .post(self.url(&format!("/items/{}/createUploadSession", id.as_str())))
                    .json(&UploadSessionBody {
                        item: UploadSessionItem {
                            conflict_behavior: "replace",
                        },
                    }),
                "upload",
            )
            .await?;
        let item = self
            .upload_chunked(&session.upload_url, content, size)
            .await?;
        Ok(drive_item_to_cloud_file(item, id))
    }

    async fn delete(&self, id: &Id) -> Result<(), Self::Error> {
        self.send_ok(
            self.client.delete(self.url(&format!("/items/{}", id.as_str()))),
            "remove_item",
        )
        .await
    }

    async fn rename_move(
        &self,
        id: &Id,
        name: Option<&str>,
        destination: Option<&Id>,
    ) -> Result<(), Self::Error> {
        let body = MoveRenameBody {
            name,
            parent_reference: destination.map(|d| ParentReferenceRef { id: d.as_str() }),
        };
        self.send_ok(
            self.client
                .patch(self.url(&format!("/items/{}", id.as_str())))
                .json(&body),
            "move_rename_item",
        )
        .await
    }

    async fn download(
        &self,
        id: &Id,
        sink: &mut (dyn AsyncWrite + Unpin + Send),
        _size: u64,
        digests: &Digests,
    ) -> Result<(), Self::Error> {
        let response = self
            .client
            .get(self.url(&format!("/items/{}/content", id.as_str())))
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(inerr("download_file"))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CloudError::Status {
                src: "download_file".into(),
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await.map_err(inerr("download_file"))?;
        sink.write_all(&bytes)
            .await
            .map_err(|err| generr("download_file", err))?;

        let actual = hasher::hash_bytes(&bytes);
        for (algorithm, expected) in digests {
            if let Some(actual) = actual.get(algorithm) {
                if !actual.eq_ignore_ascii_case(expected) {
                    return Err(CloudError::ChecksumMismatch {
                        id: id.to_string(),
                        algorithm: algorithm.clone(),
                        expected: expected.clone(),
                        actual: actual.clone(),
                    });
                }
            }
        }

        Ok(())
    }
}
