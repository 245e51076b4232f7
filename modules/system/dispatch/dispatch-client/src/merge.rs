use dispatch_sdk::{MergePolicy, ParamMap};

/// Merge profile-level `shared` entries into a per-call map.
///
/// `own` is the request's private copy; the profile's maps are only read.
pub fn merge_shared(own: &mut ParamMap, shared: ParamMap, policy: MergePolicy) {
    match policy {
        MergePolicy::SharedWins => {
            for (key, value) in shared {
                own.insert(key, value);
            }
        }
        MergePolicy::RequestWins => {
            for (key, value) in shared {
                own.entry(key).or_insert(value);
            }
        }
    }
}

/// Same as [`merge_shared`], with header names compared case-insensitively.
///
/// Under `SharedWins` a colliding per-call entry is replaced by the shared one,
/// spelled as the profile spells it.
pub fn merge_headers(own: &mut ParamMap, shared: ParamMap, policy: MergePolicy) {
    for (name, value) in shared {
        let colliding: Vec<String> = own
            .keys()
            .filter(|existing| existing.eq_ignore_ascii_case(&name))
            .cloned()
            .collect();

        match policy {
            MergePolicy::SharedWins => {
                for existing in &colliding {
                    own.remove(existing);
                }
                own.insert(name, value);
            }
            MergePolicy::RequestWins => {
                if colliding.is_empty() {
                    own.insert(name, value);
                }
            }
        }
    }
}
