use recon_model::{Digests, File, Id};

/// Cloud-side two-way comparator: two cloud revisions of the same file are
/// equivalent iff their `cTag` matches. Used when diffing the last-saved
/// tree against a freshly-retrieved cloud snapshot.
pub fn compare_by_ctag(before: &File, after: &File) -> bool {
    match (before.as_cloud(), after.as_cloud()) {
        (Some(b), Some(a)) => b.c_tag == a.c_tag,
        _ => false,
    }
}

/// Local-side two-way comparator: a local file is equivalent to its saved
/// counterpart if it has not been touched since the last successful sync,
/// i.e. its modification time does not postdate `last_sync_ns`. Only the
/// `after` side carries a modification time, so `before` is unused.
pub fn compare_by_mtime(last_sync_ns: i128) -> impl Fn(&File, &File) -> bool {
    move |_before, after| match after.as_local() {
        Some(local) => local.mtime_ns <= last_sync_ns,
        None => false,
    }
}

/// Content comparator for download-only runs, where no saved tree exists to
/// anchor a cTag or mtime comparison: a local file is equivalent to a cloud
/// one if every digest the cloud advertises matches the corresponding digest
/// of the local bytes, compared case-insensitively. Vacuously true when the
/// cloud advertises no hashes at all. `hash_local` computes digests on
/// demand rather than up front, since most files never need it.
pub fn compare_by_content_hash<F>(hash_local: F) -> impl Fn(&File, &File) -> bool
where
    F: Fn(&Id) -> Digests,
{
    move |before, after| {
        let (cloud, local) = match (before.as_cloud(), after.as_local()) {
            (Some(c), Some(l)) => (c, l),
            _ => match (after.as_cloud(), before.as_local()) {
                (Some(c), Some(l)) => (c, l),
                _ => return false,
            },
        };
        let local_digests = hash_local(&local.id);
        cloud.hashes.iter().all(|(algorithm, digest)| {
            local_digests
                .get(algorithm)
                .is_some_and(|local_digest| local_digest.eq_ignore_ascii_case(digest))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use recon_model::{CloudFile, LocalFile};
    use std::collections::BTreeMap;

    fn cloud(c_tag: &str, hashes: Digests) -> File {
        File::Cloud(CloudFile {
            id: Id::real("f1"),
            name: "a".into(),
            parent: Id::real("root"),
            size: 0,
            e_tag: "e".into(),
            c_tag: c_tag.into(),
            hashes,
        })
    }

    fn local(mtime_ns: i128) -> File {
        File::Local(LocalFile {
            id: Id::real("f1"),
            name: "a".into(),
            parent: Id::real("root"),
            size: 0,
            mtime_ns,
        })
    }

    #[test]
    fn ctag_equality_is_exact() {
        let a = cloud("tag1", BTreeMap::new());
        let b = cloud("tag1", BTreeMap::new());
        let c = cloud("tag2", BTreeMap::new());
        assert!(compare_by_ctag(&a, &b));
        assert!(!compare_by_ctag(&a, &c));
    }

    #[test]
    fn mtime_comparator_only_looks_at_after() {
        let cmp = compare_by_mtime(1_000);
        let saved = cloud("t", BTreeMap::new());
        assert!(cmp(&saved, &local(500)));
        assert!(!cmp(&saved, &local(1_500)));
    }

    #[test]
    fn hash_comparator_is_case_insensitive() {
        let mut hashes = BTreeMap::new();
        hashes.insert("sha1".to_string(), "ABCDEF".to_string());
        let cmp = compare_by_content_hash(|_id| {
            let mut d = BTreeMap::new();
            d.insert("sha1".to_string(), "abcdef".to_string());
            d
        });
        assert!(cmp(&cloud("t", hashes.clone()), &local(0)));

        let cmp_miss = compare_by_content_hash(|_id| BTreeMap::new());
        assert!(!cmp_miss(&cloud("t", hashes), &local(0)));
    }

    #[test]
    fn hash_comparator_requires_every_advertised_digest_to_match() {
        let mut hashes = BTreeMap::new();
        hashes.insert("sha1".to_string(), "ABCDEF".to_string());
        hashes.insert("crc32".to_string(), "00000000".to_string());

        // Only one of the two advertised digests matches locally: not equivalent.
        let cmp_partial = compare_by_content_hash(|_id| {
            let mut d = BTreeMap::new();
            d.insert("sha1".to_string(), "abcdef".to_string());
            d.insert("crc32".to_string(), "ffffffff".to_string());
            d
        });
        assert!(!cmp_partial(&cloud("t", hashes.clone()), &local(0)));

        // Both advertised digests match: equivalent.
        let cmp_full = compare_by_content_hash(|_id| {
            let mut d = BTreeMap::new();
            d.insert("sha1".to_string(), "abcdef".to_string());
            d.insert("crc32".to_string(), "00000000".to_string());
            d
        });
        assert!(cmp_full(&cloud("t", hashes), &local(0)));
    }

    #[test]
    fn hash_comparator_is_vacuously_true_when_cloud_advertises_no_hashes() {
        let cmp = compare_by_content_hash(|_id| BTreeMap::new());
        assert!(cmp(&cloud("t", BTreeMap::new()), &local(0)));
    }
}
