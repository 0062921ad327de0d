//! Multi-profile post composition state.
//!
//! The composer holds one draft per selected profile and keeps the draft
//! key set equal to the selection at all times. Everything here is pure,
//! synchronous state manipulation; persistence happens elsewhere via the
//! [`PlatformCopy`] list produced by [`PostComposer::export`].

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::copies::PlatformCopy;
use crate::error::ValidationError;
use crate::platform::Platform;

/// The slice of a profile the composer needs: identity and platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileRef {
    pub id: i64,
    pub platform: Platform,
}

/// Per-profile draft text and hashtags.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CopyDraft {
    pub content: String,
    pub hashtags: Vec<String>,
}

/// Composition state for a post targeting one or more profiles.
///
/// Invariant: the key set of the draft map equals the current selection
/// after every operation.
#[derive(Debug, Clone, Default)]
pub struct PostComposer {
    selection: Vec<i64>,
    drafts: HashMap<i64, CopyDraft>,
}

impl PostComposer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Selected profile ids, in selection order.
    #[must_use]
    pub fn selection(&self) -> &[i64] {
        &self.selection
    }

    #[must_use]
    pub fn draft(&self, profile_id: i64) -> Option<&CopyDraft> {
        self.drafts.get(&profile_id)
    }

    /// Replace the draft for a selected profile. Returns false (and changes
    /// nothing) when the profile is not in the selection.
    pub fn set_draft(&mut self, profile_id: i64, draft: CopyDraft) -> bool {
        if !self.drafts.contains_key(&profile_id) {
            return false;
        }
        self.drafts.insert(profile_id, draft);
        true
    }

    /// Reconcile the draft map with a new selection.
    ///
    /// Newly selected profiles get an empty draft; deselected profiles lose
    /// theirs; surviving drafts are untouched. Idempotent: applying the same
    /// selection twice is a no-op. Duplicate ids in the input collapse to
    /// their first occurrence.
    pub fn sync_selection(&mut self, selected: &[i64]) {
        let mut seen = HashSet::with_capacity(selected.len());
        self.selection = selected
            .iter()
            .copied()
            .filter(|id| seen.insert(*id))
            .collect();

        for id in &self.selection {
            self.drafts.entry(*id).or_default();
        }
        self.drafts.retain(|id, _| seen.contains(id));
    }

    /// Partition the selected profiles by platform, in first-seen selection
    /// order, one group per platform touched by the selection.
    #[must_use]
    pub fn group_by_platform<'a>(
        &self,
        profiles: &'a [ProfileRef],
    ) -> Vec<(Platform, Vec<&'a ProfileRef>)> {
        let mut groups: Vec<(Platform, Vec<&ProfileRef>)> = Vec::new();
        for id in &self.selection {
            let Some(profile) = profiles.iter().find(|p| p.id == *id) else {
                continue;
            };
            match groups.iter_mut().find(|(p, _)| *p == profile.platform) {
                Some((_, members)) => members.push(profile),
                None => groups.push((profile.platform.clone(), vec![profile])),
            }
        }
        groups
    }

    /// Copy the source profile's draft verbatim onto every other selected
    /// profile of the same platform. Profiles on other platforms and the
    /// source itself are untouched. A source that is unselected or unknown
    /// is a no-op.
    pub fn copy_to_platform(&mut self, source_id: i64, profiles: &[ProfileRef]) {
        let Some(source_platform) = profiles
            .iter()
            .find(|p| p.id == source_id)
            .map(|p| p.platform.clone())
        else {
            return;
        };
        let Some(source_draft) = self.drafts.get(&source_id).cloned() else {
            return;
        };

        let targets: Vec<i64> = self
            .selection
            .iter()
            .copied()
            .filter(|id| *id != source_id)
            .filter(|id| {
                profiles
                    .iter()
                    .any(|p| p.id == *id && p.platform == source_platform)
            })
            .collect();
        for id in targets {
            self.drafts.insert(id, source_draft.clone());
        }
    }

    /// Initialize drafts from previously persisted copies.
    ///
    /// Entries carrying a profile id are assigned directly to that profile
    /// (when selected). Legacy platform-level entries broadcast to every
    /// selected profile of that platform that has not been assigned yet —
    /// first write wins, so a second legacy entry for the same platform
    /// populates nothing.
    pub fn import_copies(&mut self, copies: &[PlatformCopy], profiles: &[ProfileRef]) {
        let mut assigned: HashSet<i64> = HashSet::new();

        for copy in copies {
            let draft = CopyDraft {
                content: copy.content.clone(),
                hashtags: copy.hashtags.clone(),
            };
            match copy.profile_id {
                Some(id) => {
                    if self.drafts.contains_key(&id) {
                        self.drafts.insert(id, draft);
                        assigned.insert(id);
                    }
                }
                None => {
                    let targets: Vec<i64> = self
                        .selection
                        .iter()
                        .copied()
                        .filter(|id| !assigned.contains(id))
                        .filter(|id| {
                            profiles
                                .iter()
                                .any(|p| p.id == *id && p.platform == copy.platform)
                        })
                        .collect();
                    for id in targets {
                        self.drafts.insert(id, draft.clone());
                        assigned.insert(id);
                    }
                }
            }
        }
    }

    /// Flatten the draft map into a persistable copy list, in selection
    /// order. A profile id that no longer resolves is dropped from the
    /// export; the drop is logged because the draft text is lost with it.
    #[must_use]
    pub fn export(&self, profiles: &[ProfileRef]) -> Vec<PlatformCopy> {
        let mut out = Vec::with_capacity(self.selection.len());
        for id in &self.selection {
            let Some(profile) = profiles.iter().find(|p| p.id == *id) else {
                tracing::warn!(
                    profile_id = id,
                    "dropping copy for unresolvable profile on export"
                );
                continue;
            };
            let Some(draft) = self.drafts.get(id) else {
                continue;
            };
            out.push(PlatformCopy {
                platform: profile.platform.clone(),
                content: draft.content.clone(),
                hashtags: draft.hashtags.clone(),
                profile_id: Some(*id),
            });
        }
        out
    }

    /// Submission precondition: at least one profile selected.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::NoProfilesSelected`] on an empty selection.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.selection.is_empty() {
            return Err(ValidationError::NoProfilesSelected);
        }
        Ok(())
    }
}

/// Check that every copy carrying a profile id references a member of
/// `profile_ids`. Used at the submission boundary before anything is
/// persisted.
///
/// # Errors
///
/// Returns [`ValidationError::CopyForUnselectedProfile`] naming the first
/// offending profile id.
pub fn validate_copies(copies: &[PlatformCopy], profile_ids: &[i64]) -> Result<(), ValidationError> {
    for copy in copies {
        if let Some(id) = copy.profile_id {
            if !profile_ids.contains(&id) {
                return Err(ValidationError::CopyForUnselectedProfile { profile_id: id });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profiles() -> Vec<ProfileRef> {
        vec![
            ProfileRef { id: 1, platform: Platform::Instagram },
            ProfileRef { id: 2, platform: Platform::Instagram },
            ProfileRef { id: 3, platform: Platform::TikTok },
            ProfileRef { id: 4, platform: Platform::Other("threads".to_owned()) },
        ]
    }

    fn draft(content: &str, hashtags: &[&str]) -> CopyDraft {
        CopyDraft {
            content: content.to_owned(),
            hashtags: hashtags.iter().map(|h| (*h).to_owned()).collect(),
        }
    }

    fn sorted_keys(composer: &PostComposer) -> Vec<i64> {
        let mut keys: Vec<i64> = composer.drafts.keys().copied().collect();
        keys.sort_unstable();
        keys
    }

    #[test]
    fn sync_keeps_draft_keys_equal_to_selection() {
        let mut composer = PostComposer::new();

        composer.sync_selection(&[1, 3]);
        assert_eq!(sorted_keys(&composer), vec![1, 3]);

        composer.sync_selection(&[1, 2, 3]);
        assert_eq!(sorted_keys(&composer), vec![1, 2, 3]);

        composer.sync_selection(&[2]);
        assert_eq!(sorted_keys(&composer), vec![2]);

        composer.sync_selection(&[]);
        assert!(sorted_keys(&composer).is_empty());
    }

    #[test]
    fn sync_is_idempotent_and_preserves_existing_drafts() {
        let mut composer = PostComposer::new();
        composer.sync_selection(&[1, 2]);
        assert!(composer.set_draft(1, draft("keep me", &["#a"])));

        composer.sync_selection(&[1, 2]);
        composer.sync_selection(&[1, 2]);
        assert_eq!(composer.draft(1), Some(&draft("keep me", &["#a"])));
        assert_eq!(composer.draft(2), Some(&CopyDraft::default()));
    }

    #[test]
    fn sync_collapses_duplicate_ids() {
        let mut composer = PostComposer::new();
        composer.sync_selection(&[1, 1, 2, 1]);
        assert_eq!(composer.selection(), &[1, 2]);
    }

    #[test]
    fn set_draft_rejects_unselected_profiles() {
        let mut composer = PostComposer::new();
        composer.sync_selection(&[1]);
        assert!(!composer.set_draft(9, draft("stray", &[])));
        assert!(composer.draft(9).is_none());
    }

    #[test]
    fn grouping_partitions_by_platform_in_selection_order() {
        let profiles = profiles();
        let mut composer = PostComposer::new();
        composer.sync_selection(&[3, 1, 2]);

        let groups = composer.group_by_platform(&profiles);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].0, Platform::TikTok);
        assert_eq!(groups[0].1.iter().map(|p| p.id).collect::<Vec<_>>(), vec![3]);
        assert_eq!(groups[1].0, Platform::Instagram);
        assert_eq!(groups[1].1.iter().map(|p| p.id).collect::<Vec<_>>(), vec![1, 2]);
    }

    #[test]
    fn one_tab_per_platform_for_a_mixed_selection() {
        // Instagram + TikTok selection renders two platform sections, with
        // independent content per profile.
        let profiles = profiles();
        let mut composer = PostComposer::new();
        composer.sync_selection(&[1, 3]);
        composer.set_draft(1, draft("ig copy", &[]));
        composer.set_draft(3, draft("tt copy", &[]));

        let groups = composer.group_by_platform(&profiles);
        assert_eq!(groups.len(), 2);

        let exported = composer.export(&profiles);
        assert_eq!(exported.len(), 2);
        assert_eq!(exported[0].profile_id, Some(1));
        assert_eq!(exported[0].content, "ig copy");
        assert_eq!(exported[1].profile_id, Some(3));
        assert_eq!(exported[1].content, "tt copy");
    }

    #[test]
    fn copy_to_platform_touches_only_same_platform_peers() {
        let profiles = profiles();
        let mut composer = PostComposer::new();
        composer.sync_selection(&[1, 2, 3]);
        composer.set_draft(1, draft("shared", &["#x"]));
        composer.set_draft(3, draft("tiktok only", &[]));

        composer.copy_to_platform(1, &profiles);

        assert_eq!(composer.draft(2), Some(&draft("shared", &["#x"])));
        assert_eq!(composer.draft(3), Some(&draft("tiktok only", &[])));
        assert_eq!(composer.draft(1), Some(&draft("shared", &["#x"])));
    }

    #[test]
    fn copy_to_platform_skips_unselected_peers() {
        let profiles = profiles();
        let mut composer = PostComposer::new();
        composer.sync_selection(&[1]);
        composer.set_draft(1, draft("solo", &[]));

        composer.copy_to_platform(1, &profiles);
        assert!(composer.draft(2).is_none());
    }

    #[test]
    fn import_assigns_explicit_profile_entries_directly() {
        let profiles = profiles();
        let mut composer = PostComposer::new();
        composer.sync_selection(&[1, 2]);

        composer.import_copies(
            &[PlatformCopy {
                platform: Platform::Instagram,
                content: "mine".to_owned(),
                hashtags: vec![],
                profile_id: Some(2),
            }],
            &profiles,
        );

        assert_eq!(composer.draft(2), Some(&draft("mine", &[])));
        assert_eq!(composer.draft(1), Some(&CopyDraft::default()));
    }

    #[test]
    fn import_broadcasts_legacy_entries_first_write_wins() {
        let profiles = profiles();
        let mut composer = PostComposer::new();
        composer.sync_selection(&[1, 2, 3]);

        composer.import_copies(
            &[
                PlatformCopy {
                    platform: Platform::Instagram,
                    content: "first".to_owned(),
                    hashtags: vec![],
                    profile_id: None,
                },
                PlatformCopy {
                    platform: Platform::Instagram,
                    content: "second".to_owned(),
                    hashtags: vec![],
                    profile_id: None,
                },
            ],
            &profiles,
        );

        assert_eq!(composer.draft(1), Some(&draft("first", &[])));
        assert_eq!(composer.draft(2), Some(&draft("first", &[])));
        assert_eq!(composer.draft(3), Some(&CopyDraft::default()));
    }

    #[test]
    fn import_legacy_skips_profiles_already_assigned_explicitly() {
        let profiles = profiles();
        let mut composer = PostComposer::new();
        composer.sync_selection(&[1, 2]);

        composer.import_copies(
            &[
                PlatformCopy {
                    platform: Platform::Instagram,
                    content: "explicit".to_owned(),
                    hashtags: vec![],
                    profile_id: Some(1),
                },
                PlatformCopy {
                    platform: Platform::Instagram,
                    content: "legacy".to_owned(),
                    hashtags: vec![],
                    profile_id: None,
                },
            ],
            &profiles,
        );

        assert_eq!(composer.draft(1), Some(&draft("explicit", &[])));
        assert_eq!(composer.draft(2), Some(&draft("legacy", &[])));
    }

    #[test]
    fn import_ignores_entries_for_unselected_profiles() {
        let profiles = profiles();
        let mut composer = PostComposer::new();
        composer.sync_selection(&[1]);

        composer.import_copies(
            &[PlatformCopy {
                platform: Platform::TikTok,
                content: "nope".to_owned(),
                hashtags: vec![],
                profile_id: Some(3),
            }],
            &profiles,
        );

        assert_eq!(sorted_keys(&composer), vec![1]);
    }

    #[test]
    fn export_then_import_round_trips() {
        let profiles = profiles();
        let mut composer = PostComposer::new();
        composer.sync_selection(&[1, 3, 4]);
        composer.set_draft(1, draft("ig", &["#ig"]));
        composer.set_draft(3, draft("tt", &["#tt"]));
        composer.set_draft(4, draft("custom", &[]));

        let exported = composer.export(&profiles);

        let mut restored = PostComposer::new();
        restored.sync_selection(&[1, 3, 4]);
        restored.import_copies(&exported, &profiles);

        for id in [1, 3, 4] {
            assert_eq!(restored.draft(id), composer.draft(id), "profile {id}");
        }
    }

    #[test]
    fn export_drops_unresolvable_profiles() {
        let profiles = profiles();
        let mut composer = PostComposer::new();
        composer.sync_selection(&[1, 99]);
        composer.set_draft(1, draft("kept", &[]));
        composer.set_draft(99, draft("lost", &[]));

        let exported = composer.export(&profiles);
        assert_eq!(exported.len(), 1);
        assert_eq!(exported[0].profile_id, Some(1));
    }

    #[test]
    fn validate_requires_a_selection() {
        let mut composer = PostComposer::new();
        assert_eq!(composer.validate(), Err(ValidationError::NoProfilesSelected));
        composer.sync_selection(&[1]);
        assert_eq!(composer.validate(), Ok(()));
    }

    #[test]
    fn validate_copies_rejects_foreign_profile_ids() {
        let copies = vec![PlatformCopy {
            platform: Platform::Instagram,
            content: String::new(),
            hashtags: vec![],
            profile_id: Some(8),
        }];
        assert_eq!(
            validate_copies(&copies, &[1, 2]),
            Err(ValidationError::CopyForUnselectedProfile { profile_id: 8 })
        );
        assert_eq!(validate_copies(&copies, &[8]), Ok(()));
    }
}
