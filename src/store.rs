//! The profile store: registration, verification and persistence.
//!
//! A [`ProfileStore`] owns all profile state. It is a single-owner object;
//! callers needing shared access serialize it externally. Registration
//! parks the profile behind a random verification code; [`ProfileStore::verify`]
//! promotes it with the next monotonically increasing ID. Expired pending
//! entries are swept lazily on each register/verify call, never by a
//! background timer.

use chrono::{DateTime, Duration, Utc};
use rand::distributions::Alphanumeric;
use rand::Rng;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::codec::{self, DATA_FILE_EXTENSION};
use crate::compound::Compound;
use crate::error::RecordResult;
use crate::profile::{email_has_allowed_suffix, Profile};

/// Default lifetime of a pending verification, in minutes.
pub const DEFAULT_VERIFICATION_TTL_MINUTES: i64 = 10;
/// Default verification-code length.
pub const DEFAULT_CODE_LENGTH: usize = 10;

const GLOBAL_FILE_STEM: &str = "global";
const ENTRIES_FILE_STEM: &str = "entries";

/// Field ID of the next session ID in the global counters record.
const FIELD_NEXT_SESSION_ID: u16 = 1;
/// Field ID of the next profile ID in the global counters record.
const FIELD_NEXT_PROFILE_ID: u16 = 3;
/// Field ID of the profile array in the entries record.
const FIELD_ENTRIES: u16 = 1;

/// Store configuration, built in the builder style.
///
/// # Examples
///
/// ```rust
/// use lostthing::StoreOptions;
///
/// let options = StoreOptions::new()
///     .allowed_email_suffix("@inbox.lv")
///     .code_length(6);
/// ```
#[derive(Debug, Clone)]
pub struct StoreOptions {
    allowed_email_suffixes: Vec<String>,
    verification_ttl: Duration,
    code_length: usize,
}

impl StoreOptions {
    /// Options with no suffix restriction, a ten-minute verification TTL
    /// and ten-character codes.
    #[must_use]
    pub fn new() -> Self {
        StoreOptions {
            allowed_email_suffixes: Vec::new(),
            verification_ttl: Duration::minutes(DEFAULT_VERIFICATION_TTL_MINUTES),
            code_length: DEFAULT_CODE_LENGTH,
        }
    }

    /// Adds an allowed email suffix. Once any suffix is set, registrations
    /// must match one of them.
    #[must_use]
    pub fn allowed_email_suffix(mut self, suffix: &str) -> Self {
        self.allowed_email_suffixes.push(suffix.to_string());
        self
    }

    /// How long a pending verification stays redeemable.
    #[must_use]
    pub fn verification_ttl(mut self, ttl: Duration) -> Self {
        self.verification_ttl = ttl;
        self
    }

    /// Length of generated verification codes.
    #[must_use]
    pub fn code_length(mut self, length: usize) -> Self {
        self.code_length = length;
        self
    }
}

impl Default for StoreOptions {
    fn default() -> Self {
        StoreOptions::new()
    }
}

#[derive(Debug, Clone)]
struct PendingProfile {
    profile: Profile,
    code: String,
    created_at: DateTime<Utc>,
}

/// Owns every verified profile, the pending-verification map and the
/// global ID counters.
#[derive(Debug)]
pub struct ProfileStore {
    options: StoreOptions,
    profiles: Vec<Profile>,
    pending: HashMap<String, PendingProfile>,
    next_profile_id: u64,
    next_session_id: u64,
}

impl ProfileStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new(options: StoreOptions) -> Self {
        ProfileStore {
            options,
            profiles: Vec::new(),
            pending: HashMap::new(),
            next_profile_id: 1,
            next_session_id: 1,
        }
    }

    /// The verified profiles, in verification order.
    #[must_use]
    pub fn profiles(&self) -> &[Profile] {
        &self.profiles
    }

    /// Number of verified profiles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    /// Whether no profile has been verified yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    /// Number of registrations still awaiting verification.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Finds a verified profile by email.
    #[must_use]
    pub fn profile_by_email(&self, email: &str) -> Option<&Profile> {
        let email = email.trim();
        self.profiles.iter().find(|p| p.email() == email)
    }

    /// Finds a verified profile by ID.
    #[must_use]
    pub fn profile_by_id(&self, id: u64) -> Option<&Profile> {
        self.profiles.iter().find(|p| p.id() == id)
    }

    /// Mutable lookup by ID, for post/comment bookkeeping.
    pub fn profile_by_id_mut(&mut self, id: u64) -> Option<&mut Profile> {
        self.profiles.iter_mut().find(|p| p.id() == id)
    }

    /// Hands out the next session ID.
    pub fn next_session_id(&mut self) -> u64 {
        let id = self.next_session_id;
        self.next_session_id += 1;
        id
    }

    /// Registers a new profile and returns its verification code, which the
    /// caller delivers to the user out of band.
    ///
    /// Returns `None` when any field fails validation, the email suffix is
    /// not allowed, or the email is already taken (verified or pending).
    pub fn register<R: Rng>(
        &mut self,
        name: &str,
        surname: &str,
        email: &str,
        password: &str,
        rng: &mut R,
    ) -> Option<String> {
        self.register_at(name, surname, email, password, rng, Utc::now())
    }

    /// [`register`](Self::register) with an explicit clock.
    pub fn register_at<R: Rng>(
        &mut self,
        name: &str,
        surname: &str,
        email: &str,
        password: &str,
        rng: &mut R,
        now: DateTime<Utc>,
    ) -> Option<String> {
        self.sweep_expired(now);

        let Some(profile) = Profile::new(name, surname, email, password) else {
            warn!("registration rejected: invalid field");
            return None;
        };
        if !email_has_allowed_suffix(profile.email(), &self.options.allowed_email_suffixes) {
            warn!(email = profile.email(), "registration rejected: email suffix not allowed");
            return None;
        }
        if self.profile_by_email(profile.email()).is_some()
            || self.pending.contains_key(profile.email())
        {
            warn!(email = profile.email(), "registration rejected: email already taken");
            return None;
        }

        let code = generate_code(rng, self.options.code_length);
        let email_key = profile.email().to_string();
        debug!(email = %email_key, "registration pending verification");
        self.pending.insert(
            email_key,
            PendingProfile {
                profile,
                code: code.clone(),
                created_at: now,
            },
        );
        Some(code)
    }

    /// Redeems a verification code, promoting the pending profile with the
    /// next profile ID. Returns the verified profile on success.
    pub fn verify(&mut self, email: &str, code: &str) -> Option<&Profile> {
        self.verify_at(email, code, Utc::now())
    }

    /// [`verify`](Self::verify) with an explicit clock.
    pub fn verify_at(&mut self, email: &str, code: &str, now: DateTime<Utc>) -> Option<&Profile> {
        self.sweep_expired(now);

        let email = email.trim();
        if self.pending.get(email)?.code != code {
            debug!(email, "verification failed: wrong code");
            return None;
        }

        let pending = self.pending.remove(email)?;
        let mut profile = pending.profile;
        profile.assign_id(self.next_profile_id);
        self.next_profile_id += 1;
        info!(email, id = profile.id(), "profile verified");
        self.profiles.push(profile);
        self.profiles.last()
    }

    /// Drops pending entries older than the verification TTL.
    pub fn sweep_expired(&mut self, now: DateTime<Utc>) {
        let ttl = self.options.verification_ttl;
        let before = self.pending.len();
        self.pending
            .retain(|_, pending| now.signed_duration_since(pending.created_at) <= ttl);
        let dropped = before - self.pending.len();
        if dropped > 0 {
            debug!(dropped, "expired pending registrations swept");
        }
    }

    fn global_path(dir: &Path) -> PathBuf {
        dir.join(GLOBAL_FILE_STEM).with_extension(DATA_FILE_EXTENSION)
    }

    fn entries_path(dir: &Path) -> PathBuf {
        dir.join(ENTRIES_FILE_STEM).with_extension(DATA_FILE_EXTENSION)
    }

    /// Writes the global counters and the profile entries into `dir`.
    /// Pending registrations are ephemeral and never persisted.
    pub fn save(&self, dir: &Path) -> RecordResult<()> {
        let mut global = Compound::with_capacity(2);
        global.insert(FIELD_NEXT_SESSION_ID, self.next_session_id);
        global.insert(FIELD_NEXT_PROFILE_ID, self.next_profile_id);
        codec::write_compound_file(&Self::global_path(dir), &global)?;

        let entries: Vec<Compound> = self.profiles.iter().map(Profile::to_compound).collect();
        let mut record = Compound::with_capacity(1);
        record.insert(FIELD_ENTRIES, entries);
        codec::write_compound_file(&Self::entries_path(dir), &record)?;

        info!(profiles = self.profiles.len(), dir = %dir.display(), "store saved");
        Ok(())
    }

    /// Loads the global counters and profiles from `dir`, replacing the
    /// store's current state. Returns the number of profiles loaded.
    ///
    /// Missing files leave the defaults in place. A profile record that
    /// fails to decode is logged and skipped; the rest of the batch still
    /// loads.
    pub fn load(&mut self, dir: &Path) -> RecordResult<usize> {
        let global_path = Self::global_path(dir);
        if global_path.exists() {
            let global = codec::read_compound_file(&global_path)?;
            self.next_session_id = global.get_u64_or(FIELD_NEXT_SESSION_ID, 1)?;
            self.next_profile_id = global.get_u64_or(FIELD_NEXT_PROFILE_ID, 1)?;
        } else {
            debug!(path = %global_path.display(), "no global record, using defaults");
        }

        self.profiles.clear();
        let entries_path = Self::entries_path(dir);
        if !entries_path.exists() {
            debug!(path = %entries_path.display(), "no entries record, starting empty");
            return Ok(0);
        }

        let record = codec::read_compound_file(&entries_path)?;
        let entries = record.get_compound_list_or_empty(FIELD_ENTRIES)?;
        let mut skipped = 0usize;
        for entry in entries {
            match Profile::from_compound(entry) {
                Ok(profile) => {
                    // Counters must stay ahead of whatever IDs are on disk.
                    if profile.id() >= self.next_profile_id {
                        self.next_profile_id = profile.id() + 1;
                    }
                    self.profiles.push(profile);
                }
                Err(error) => {
                    skipped += 1;
                    warn!(%error, "skipping undecodable profile record");
                }
            }
        }

        info!(
            loaded = self.profiles.len(),
            skipped,
            dir = %dir.display(),
            "store loaded"
        );
        Ok(self.profiles.len())
    }
}

fn generate_code<R: Rng>(rng: &mut R, length: usize) -> String {
    rng.sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    fn register(store: &mut ProfileStore, email: &str) -> Option<String> {
        store.register("Anna", "Liepa", email, "secret1", &mut rng())
    }

    #[test]
    fn register_then_verify_assigns_increasing_ids() {
        let mut store = ProfileStore::new(StoreOptions::new());

        let code_a = register(&mut store, "a@inbox.lv").unwrap();
        let code_b = register(&mut store, "b@inbox.lv").unwrap();
        assert_eq!(store.pending_count(), 2);
        assert!(store.is_empty());

        let first = store.verify("a@inbox.lv", &code_a).unwrap();
        assert_eq!(first.id(), 1);
        let second = store.verify("b@inbox.lv", &code_b).unwrap();
        assert_eq!(second.id(), 2);
        assert_eq!(store.len(), 2);
        assert_eq!(store.pending_count(), 0);
    }

    #[test]
    fn verification_code_has_the_configured_length() {
        let mut store = ProfileStore::new(StoreOptions::new().code_length(24));
        let code = register(&mut store, "a@inbox.lv").unwrap();
        assert_eq!(code.len(), 24);
        assert!(code.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn wrong_code_does_not_verify() {
        let mut store = ProfileStore::new(StoreOptions::new());
        let code = register(&mut store, "a@inbox.lv").unwrap();

        assert!(store.verify("a@inbox.lv", "not-the-code").is_none());
        assert_eq!(store.pending_count(), 1);
        assert!(store.verify("a@inbox.lv", &code).is_some());
    }

    #[test]
    fn duplicate_emails_are_rejected() {
        let mut store = ProfileStore::new(StoreOptions::new());
        let code = register(&mut store, "a@inbox.lv").unwrap();

        // Still pending: taken.
        assert!(register(&mut store, "a@inbox.lv").is_none());

        store.verify("a@inbox.lv", &code).unwrap();
        // Verified: still taken.
        assert!(register(&mut store, "a@inbox.lv").is_none());
        assert!(register(&mut store, "b@inbox.lv").is_some());
    }

    #[test]
    fn suffix_whitelist_applies_at_registration() {
        let mut store =
            ProfileStore::new(StoreOptions::new().allowed_email_suffix("@inbox.lv"));

        assert!(register(&mut store, "a@inbox.lv").is_some());
        assert!(register(&mut store, "b@gmail.com").is_none());
    }

    #[test]
    fn invalid_fields_are_rejected() {
        let mut store = ProfileStore::new(StoreOptions::new());
        assert!(store
            .register("Anna5", "Liepa", "a@inbox.lv", "secret1", &mut rng())
            .is_none());
        assert!(store
            .register("Anna", "Liepa", "a@inbox.lv", "tiny", &mut rng())
            .is_none());
    }

    #[test]
    fn pending_entries_expire_after_the_ttl() {
        let mut store =
            ProfileStore::new(StoreOptions::new().verification_ttl(Duration::minutes(10)));
        let start = Utc::now();

        let code = store
            .register_at("Anna", "Liepa", "a@inbox.lv", "secret1", &mut rng(), start)
            .unwrap();

        // Just inside the window.
        let almost = start + Duration::minutes(10);
        assert_eq!(store.pending_count(), 1);

        // Past the window the entry is swept before the lookup.
        let late = almost + Duration::seconds(1);
        assert!(store.verify_at("a@inbox.lv", &code, late).is_none());
        assert_eq!(store.pending_count(), 0);
    }

    #[test]
    fn expired_email_can_register_again() {
        let mut store = ProfileStore::new(StoreOptions::new());
        let start = Utc::now();

        store
            .register_at("Anna", "Liepa", "a@inbox.lv", "secret1", &mut rng(), start)
            .unwrap();
        let later = start + Duration::minutes(11);
        assert!(store
            .register_at("Anna", "Liepa", "a@inbox.lv", "secret1", &mut rng(), later)
            .is_some());
    }

    #[test]
    fn session_ids_are_monotonic() {
        let mut store = ProfileStore::new(StoreOptions::new());
        assert_eq!(store.next_session_id(), 1);
        assert_eq!(store.next_session_id(), 2);
        assert_eq!(store.next_session_id(), 3);
    }

    #[test]
    fn save_and_load_round_trip() {
        let dir = std::env::temp_dir().join("lostthing-store-roundtrip");
        std::fs::create_dir_all(&dir).unwrap();

        let mut store = ProfileStore::new(StoreOptions::new());
        let code = register(&mut store, "a@inbox.lv").unwrap();
        store.verify("a@inbox.lv", &code).unwrap();
        store.next_session_id();
        store.save(&dir).unwrap();

        let mut restored = ProfileStore::new(StoreOptions::new());
        assert_eq!(restored.load(&dir).unwrap(), 1);
        assert_eq!(restored.profile_by_email("a@inbox.lv").unwrap().id(), 1);
        assert_eq!(restored.next_session_id(), 2);

        // A fresh registration continues the ID sequence.
        let code = register(&mut restored, "b@inbox.lv").unwrap();
        assert_eq!(restored.verify("b@inbox.lv", &code).unwrap().id(), 2);

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn load_from_empty_dir_keeps_defaults() {
        let dir = std::env::temp_dir().join("lostthing-store-empty");
        std::fs::create_dir_all(&dir).unwrap();

        let mut store = ProfileStore::new(StoreOptions::new());
        assert_eq!(store.load(&dir).unwrap(), 0);
        assert_eq!(store.next_session_id(), 1);

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn corrupt_entry_is_skipped_not_fatal() {
        let dir = std::env::temp_dir().join("lostthing-store-corrupt");
        std::fs::create_dir_all(&dir).unwrap();

        let good = Profile::new("Anna", "Liepa", "a@inbox.lv", "secret1")
            .unwrap()
            .to_compound();
        let mut bad = good.clone();
        bad.remove(Profile::FIELD_EMAIL);

        let mut record = Compound::new();
        record.insert(FIELD_ENTRIES, vec![good, bad]);
        codec::write_compound_file(&ProfileStore::entries_path(&dir), &record).unwrap();

        let mut store = ProfileStore::new(StoreOptions::new());
        assert_eq!(store.load(&dir).unwrap(), 1);
        assert!(store.profile_by_email("a@inbox.lv").is_some());

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
