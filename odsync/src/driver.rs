use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{bail, Context, Result};

use recon_apply::{apply_cloud_script, apply_local_script, CloudCollaborator, LocalCollaborator, WalkEntry};
use recon_model::{CloudFile, Directory, File, Id, PlaceholderCounter, Tree};
use recon_sched::{check_same_node_operations, field_test, optimize_cloud_deletion, schedule};

use cloud_api::{CloudError, GraphClient};
use local_fs::{normalize_duplicate_ids, LocalFs};
use sync_store::TreeKind;

use crate::config;
use crate::display;

/// Which side(s) of a reconciliation actually get applied this run. The
/// core always diffs both sides; this only gates which script is executed,
/// per §6's three mutually-exclusive mode flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncDirection {
    TwoWay,
    DownloadOnly,
    UploadOnly,
}

/// Runs one reconciliation. Returns `Ok(true)` if the run completed
/// (including a no-op run with nothing to do), `Ok(false)` if the user
/// declined the confirmation prompt — the caller maps that to exit code -1.
pub async fn run(direction: SyncDirection) -> Result<bool> {
    let config_path = config::config_path()?;
    let cfg = config::load(&config_path)?;
    let root_id = Id::real(
        cfg.root_id
            .context("no root_id configured; run with --set-root-id ID first")?,
    );
    let local_path = cfg
        .local_path
        .context("no local sync directory configured; run with --set-location DIR first")?;

    let mut db = sync_store::open(config::db_path(&config_path))?;
    let token = sync_store::require_config(&db, "token")
        .context("no access token configured; run with --set-token TOKEN first")?;

    let cloud = GraphClient::new(reqwest::Client::new(), token);
    let local = LocalFs::new(local_path.clone());

    let saved_tree = sync_store::load_tree(&db, TreeKind::Saved, &root_id)?;

    println!("Retrieving changes from the cloud...");
    let cloud_tree = retrieve_cloud_tree(&cloud, &db, &root_id).await?;

    println!("Walking local directory...");
    let (local_tree, mut paths) = build_local_tree(&local, &local_path, &root_id, &cloud_tree).await?;
    paths.insert(root_id.clone(), local_path.clone());

    let last_sync_ns: Option<i128> = sync_store::get_config(&db, "last_sync_time")?
        .and_then(|s| s.parse().ok());

    let local_comparator: Box<dyn Fn(&File, &File) -> bool> = match last_sync_ns {
        Some(ns) => Box::new(recon_diff::compare_by_mtime(ns)),
        None => {
            let local_index = paths.clone();
            Box::new(recon_diff::compare_by_content_hash(move |id: &Id| {
                local_index
                    .get(id)
                    .and_then(|path| std::fs::File::open(path).ok())
                    .and_then(|file| hasher::hash_stream(file).ok())
                    .unwrap_or_default()
            }))
        }
    };

    let pull_ops = recon_diff::diff(&saved_tree, &cloud_tree, recon_diff::compare_by_ctag)?;
    let push_ops = recon_diff::diff(&saved_tree, &local_tree, local_comparator)?;

    check_same_node_operations(&push_ops, &pull_ops)?;

    let pull_script = optimize_local_noop(schedule(pull_ops, &saved_tree)?);
    let push_script = optimize_cloud_deletion(schedule(push_ops, &saved_tree)?, &saved_tree);

    field_test(&saved_tree, &pull_script).context("pull script failed validation against the saved tree")?;
    field_test(&saved_tree, &push_script).context("push script failed validation against the saved tree")?;

    println!("{}", display::render_script("Changes to apply locally (pulled from the cloud)", &pull_script));
    println!("{}", display::render_script("Changes to push to the cloud (from local edits)", &push_script));

    if pull_script.is_empty() && push_script.is_empty() {
        println!("Nothing to do.");
        finalize(&mut db, saved_tree)?;
        return Ok(true);
    }

    if !confirm("Proceed with the changes above?")? {
        return Ok(false);
    }

    let mut push_state = saved_tree.clone();
    if matches!(direction, SyncDirection::TwoWay | SyncDirection::UploadOnly) && !push_script.is_empty() {
        let mut placeholders: HashMap<Id, Id> = HashMap::new();
        apply_cloud_script(&cloud, &local, &mut push_state, &paths, &mut placeholders, &push_script)
            .await
            .context("failed to apply changes to the cloud")?;
    }

    let mut pull_state = saved_tree.clone();
    if matches!(direction, SyncDirection::TwoWay | SyncDirection::DownloadOnly) && !pull_script.is_empty() {
        apply_local_script(&local, &cloud, &mut pull_state, &mut paths, &pull_script)
            .await
            .context("failed to apply changes to the local filesystem")?;
    }

    let final_tree = match direction {
        SyncDirection::TwoWay => {
            field_test(&push_state, &pull_script).context("could not merge push and pull results")?
        }
        SyncDirection::DownloadOnly => pull_state,
        SyncDirection::UploadOnly => push_state,
    };

    finalize(&mut db, final_tree)?;
    println!("Sync complete.");
    Ok(true)
}

/// No directory ever needs to be created twice: if a non-empty pull script
/// would add a directory the local walk already normalized onto a real id,
/// schedule still orders it correctly, so this is a placeholder identity
/// function kept for symmetry with `optimize_cloud_deletion` — there is, at
/// present, no pull-side equivalent optimization to apply.
fn optimize_local_noop(script: Vec<recon_model::Operation>) -> Vec<recon_model::Operation> {
    script
}

async fn retrieve_cloud_tree(
    cloud: &GraphClient,
    db: &rusqlite::Connection,
    root_id: &Id,
) -> Result<Tree> {
    let delta_link = sync_store::get_config(db, "delta_link")?;

    let base = match &delta_link {
        Some(_) => sync_store::load_tree(db, TreeKind::Delta, root_id)?,
        None => Tree::new(root_id.clone()),
    };

    let (items, new_token, mut tree) = match cloud.delta(root_id, delta_link.as_deref()).await {
        Ok((items, token)) => (items, token, base),
        Err(CloudError::Status { status: 410, .. }) => {
            // The persisted token expired; Graph's documented recovery is a
            // full listing from scratch.
            let (items, token) = cloud.delta(root_id, None).await.context("retrieving a fresh delta after a 410")?;
            (items, token, Tree::new(root_id.clone()))
        }
        Err(err) => bail!("could not retrieve cloud changes: {err}"),
    };

    apply_delta_items(&mut tree, items, root_id);
    sync_store::set_config(db, "delta_link", &new_token)?;
    Ok(tree)
}

fn apply_delta_items(tree: &mut Tree, items: Vec<recon_apply::DeltaItem>, root_id: &Id) {
    use recon_apply::DeltaItem;

    for item in items {
        match item {
            DeltaItem::Deleted { id } => {
                tree.files_mut().remove(&id);
                tree.dirs_mut().remove(&id);
            }
            DeltaItem::Folder { id, parent_id, name } => {
                if id == *root_id {
                    continue;
                }
                tree.dirs_mut().insert(id.clone(), Directory::new(id, name, parent_id));
            }
            DeltaItem::File {
                id,
                parent_id,
                name,
                size,
                e_tag,
                c_tag,
                hashes,
            } => {
                tree.files_mut().insert(
                    id.clone(),
                    File::Cloud(CloudFile {
                        id,
                        name,
                        parent: parent_id,
                        size,
                        e_tag,
                        c_tag,
                        hashes,
                    }),
                );
            }
        }
    }
    tree.reconstruct_by_parents();
}

/// Walks `root`, normalizes duplicate ids against `cloud`, and returns both
/// the resulting local [`Tree`] and the `id -> path` index the apply
/// orchestrator needs (including placeholder ids minted for entries with no
/// extended attribute yet).
async fn build_local_tree(
    local: &LocalFs,
    root: &Path,
    root_id: &Id,
    cloud: &Tree,
) -> Result<(Tree, HashMap<Id, PathBuf>)> {
    let entries = local.walk(root).await.context("could not walk local directory")?;

    let mut path_to_id: HashMap<PathBuf, Id> = HashMap::new();
    for entry in &entries {
        if let Some(id) = &entry.id_candidate {
            path_to_id.insert(entry.path.clone(), id.clone());
        }
    }

    let content_equivalent = |entry: &WalkEntry, cloud_file: &CloudFile| -> bool {
        if entry.is_dir {
            return false;
        }
        let Ok(file) = std::fs::File::open(&entry.path) else {
            return false;
        };
        let Ok(digests) = hasher::hash_stream(file) else {
            return false;
        };
        cloud_file
            .hashes
            .iter()
            .any(|(algorithm, digest)| digests.get(algorithm).is_some_and(|d| d.eq_ignore_ascii_case(digest)))
    };

    let normalized = normalize_duplicate_ids(
        entries,
        cloud,
        |path: &Path| path_to_id.get(path).cloned(),
        content_equivalent,
    )
    .context("local directory contains an id claimed by multiple entries but unknown to the cloud")?;

    let mut tree = Tree::new(root_id.clone());
    let mut resolved: HashMap<PathBuf, Id> = HashMap::new();
    resolved.insert(root.to_path_buf(), root_id.clone());
    let mut counter = PlaceholderCounter::new();

    for entry in normalized {
        let parent_path = entry.path.parent().unwrap_or(root).to_path_buf();
        let parent_id = resolved
            .get(&parent_path)
            .cloned()
            .with_context(|| format!("no known id for parent of {}", entry.path.display()))?;
        let id = entry.id_candidate.clone().unwrap_or_else(|| counter.next());
        let name = entry
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        resolved.insert(entry.path.clone(), id.clone());

        if entry.is_dir {
            tree.dirs_mut().insert(id.clone(), Directory::new(id, name, parent_id));
        } else {
            tree.files_mut().insert(
                id.clone(),
                File::Local(recon_model::LocalFile {
                    id,
                    name,
                    parent: parent_id,
                    size: entry.size,
                    mtime_ns: entry.mtime_ns,
                }),
            );
        }
    }

    tree.reconstruct_by_parents();
    let paths: HashMap<Id, PathBuf> = resolved.into_iter().map(|(path, id)| (id, path)).collect();
    Ok((tree, paths))
}

fn finalize(db: &mut rusqlite::Connection, tree: Tree) -> Result<()> {
    sync_store::save_tree(db, TreeKind::Saved, &tree)?;
    let now_ns = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as i128)
        .unwrap_or(0);
    sync_store::set_config(db, "last_sync_time", &now_ns.to_string())?;
    if sync_store::get_config(db, "db_version")?.is_none() {
        sync_store::set_config(db, "db_version", "1")?;
    }
    Ok(())
}

fn confirm(prompt: &str) -> Result<bool> {
    use std::io::Write;
    print!("{prompt} [y/N] ");
    std::io::stdout().flush().ok();
    let mut line = String::new();
    std::io::stdin().read_line(&mut line).context("could not read confirmation from stdin")?;
    Ok(matches!(line.trim().to_lowercase().as_str(), "y" | "yes"))
}
