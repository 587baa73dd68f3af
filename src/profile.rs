//! User profiles: field validation, password digests and the record
//! round-trip.
//!
//! Validators answer with `bool` and nothing else; only the record
//! round-trip produces typed errors. Names accept ASCII and Latvian
//! letters, emails add digits and a small special set, passwords are
//! length-checked only.

use sha2::{Digest, Sha256};

use crate::compound::Compound;
use crate::error::ProfileDecodeError;

/// Latvian letters accepted alongside ASCII in names and emails.
const LATVIAN_LETTERS: &str = "āĀčČēĒģĢīĪķĶļĻņŅšŠūŪžŽ";
/// Specials accepted in emails on top of the name set and digits.
const EMAIL_SPECIALS: &str = "@._-";

/// Maximum length of a name or surname, in characters.
pub const MAX_NAME_LENGTH: usize = 50;
/// Maximum length of an email address, in characters.
pub const MAX_EMAIL_LENGTH: usize = 100;
/// Password length bounds, in characters.
pub const MIN_PASSWORD_LENGTH: usize = 5;
pub const MAX_PASSWORD_LENGTH: usize = 100;

/// ID of a profile that has not been verified yet.
pub const UNVERIFIED_ID: u64 = 0;

/// Whether `c` may appear in a name: an ASCII letter or a Latvian letter,
/// either case.
#[must_use]
pub fn is_name_char(c: char) -> bool {
    c.is_ascii_alphabetic() || LATVIAN_LETTERS.contains(c)
}

/// Whether `c` may appear in an email address.
#[must_use]
pub fn is_email_char(c: char) -> bool {
    is_name_char(c) || c.is_ascii_digit() || EMAIL_SPECIALS.contains(c)
}

/// Validates a name or surname: non-empty after trimming, at most
/// [`MAX_NAME_LENGTH`] characters, letters only.
#[must_use]
pub fn is_valid_name(name: &str) -> bool {
    let name = name.trim();
    !name.is_empty()
        && name.chars().count() <= MAX_NAME_LENGTH
        && name.chars().all(is_name_char)
}

/// Validates an email address.
///
/// After trimming: non-empty, at most [`MAX_EMAIL_LENGTH`] characters,
/// every character from the allowed set, exactly one `@`, and no special
/// character (`@`, `.`, `_`, `-`) adjacent to another special or sitting at
/// either end of the address.
#[must_use]
pub fn is_valid_email(email: &str) -> bool {
    let email = email.trim();
    if email.is_empty()
        || email.chars().count() > MAX_EMAIL_LENGTH
        || !email.chars().all(is_email_char)
        || email.chars().filter(|c| *c == '@').count() != 1
    {
        return false;
    }

    // A special may not start or end the address or follow another special.
    let mut previous_special = true;
    for c in email.chars() {
        let special = EMAIL_SPECIALS.contains(c);
        if special && previous_special {
            return false;
        }
        previous_special = special;
    }
    !previous_special
}

/// Whether the trimmed email ends with one of the allowed suffixes. An
/// empty list allows everything.
#[must_use]
pub fn email_has_allowed_suffix(email: &str, suffixes: &[String]) -> bool {
    let email = email.trim();
    suffixes.is_empty() || suffixes.iter().any(|suffix| email.ends_with(suffix))
}

/// Validates a password: between [`MIN_PASSWORD_LENGTH`] and
/// [`MAX_PASSWORD_LENGTH`] characters, any content.
#[must_use]
pub fn is_valid_password(password: &str) -> bool {
    let length = password.chars().count();
    (MIN_PASSWORD_LENGTH..=MAX_PASSWORD_LENGTH).contains(&length)
}

/// An opaque two-part password digest. The plaintext is dropped as soon as
/// the digest is computed and is never stored or serialized.
///
/// The parts are the first 16 bytes of the SHA-256 digest of the password,
/// read as two little-endian `u64`s.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasswordDigest {
    part1: u64,
    part2: u64,
}

impl PasswordDigest {
    /// Digests a plaintext password.
    #[must_use]
    pub fn from_password(password: &str) -> Self {
        let digest = Sha256::digest(password.as_bytes());
        let mut half = [0u8; 8];
        half.copy_from_slice(&digest[0..8]);
        let part1 = u64::from_le_bytes(half);
        half.copy_from_slice(&digest[8..16]);
        let part2 = u64::from_le_bytes(half);
        PasswordDigest { part1, part2 }
    }

    /// Rebuilds a digest from its stored parts.
    #[must_use]
    pub fn from_parts(part1: u64, part2: u64) -> Self {
        PasswordDigest { part1, part2 }
    }

    /// The stored parts, in order.
    #[must_use]
    pub fn parts(&self) -> (u64, u64) {
        (self.part1, self.part2)
    }
}

/// A user profile.
///
/// Constructed unverified (ID [`UNVERIFIED_ID`]); the store assigns a real
/// ID on verification. All text fields are stored trimmed and validated;
/// the try-set mutators refuse invalid input and leave the profile
/// untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct Profile {
    id: u64,
    name: String,
    surname: String,
    email: String,
    password: PasswordDigest,
    posts: Vec<u64>,
    comments: Vec<u64>,
}

impl Profile {
    /// Record field IDs, fixed for on-disk compatibility.
    pub const FIELD_ID: u16 = 1;
    pub const FIELD_NAME: u16 = 2;
    pub const FIELD_SURNAME: u16 = 3;
    pub const FIELD_EMAIL: u16 = 4;
    pub const FIELD_DIGEST_PART1: u16 = 5;
    pub const FIELD_DIGEST_PART2: u16 = 6;
    pub const FIELD_POSTS: u16 = 7;
    pub const FIELD_COMMENTS: u16 = 8;

    /// Creates an unverified profile, or `None` if any field fails
    /// validation.
    #[must_use]
    pub fn new(name: &str, surname: &str, email: &str, password: &str) -> Option<Self> {
        if !is_valid_name(name)
            || !is_valid_name(surname)
            || !is_valid_email(email)
            || !is_valid_password(password)
        {
            return None;
        }

        Some(Profile {
            id: UNVERIFIED_ID,
            name: name.trim().to_string(),
            surname: surname.trim().to_string(),
            email: email.trim().to_string(),
            password: PasswordDigest::from_password(password),
            posts: Vec::new(),
            comments: Vec::new(),
        })
    }

    /// The assigned ID, or [`UNVERIFIED_ID`] before verification.
    #[inline]
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    #[must_use]
    pub fn surname(&self) -> &str {
        &self.surname
    }

    #[inline]
    #[must_use]
    pub fn email(&self) -> &str {
        &self.email
    }

    /// IDs of posts authored by this profile.
    #[inline]
    #[must_use]
    pub fn posts(&self) -> &[u64] {
        &self.posts
    }

    /// IDs of comments authored by this profile.
    #[inline]
    #[must_use]
    pub fn comments(&self) -> &[u64] {
        &self.comments
    }

    pub(crate) fn assign_id(&mut self, id: u64) {
        self.id = id;
    }

    /// Replaces the name if the new one is valid. Returns whether it was.
    pub fn set_name(&mut self, name: &str) -> bool {
        if !is_valid_name(name) {
            return false;
        }
        self.name = name.trim().to_string();
        true
    }

    /// Replaces the surname if the new one is valid.
    pub fn set_surname(&mut self, surname: &str) -> bool {
        if !is_valid_name(surname) {
            return false;
        }
        self.surname = surname.trim().to_string();
        true
    }

    /// Replaces the email if the new one is valid.
    pub fn set_email(&mut self, email: &str) -> bool {
        if !is_valid_email(email) {
            return false;
        }
        self.email = email.trim().to_string();
        true
    }

    /// Digests and stores a new password if it is valid.
    pub fn set_password(&mut self, password: &str) -> bool {
        if !is_valid_password(password) {
            return false;
        }
        self.password = PasswordDigest::from_password(password);
        true
    }

    /// Whether the plaintext matches the stored digest.
    #[must_use]
    pub fn verify_password(&self, password: &str) -> bool {
        PasswordDigest::from_password(password) == self.password
    }

    /// Records a post authored by this profile.
    pub fn add_post(&mut self, post_id: u64) {
        self.posts.push(post_id);
    }

    /// Records a comment authored by this profile.
    pub fn add_comment(&mut self, comment_id: u64) {
        self.comments.push(comment_id);
    }

    /// Serializes the profile into a record compound using the fixed field
    /// IDs. The password leaves only as its digest parts.
    #[must_use]
    pub fn to_compound(&self) -> Compound {
        let (part1, part2) = self.password.parts();
        let mut compound = Compound::with_capacity(8);
        compound.insert(Self::FIELD_ID, self.id);
        compound.insert(Self::FIELD_NAME, self.name.clone());
        compound.insert(Self::FIELD_SURNAME, self.surname.clone());
        compound.insert(Self::FIELD_EMAIL, self.email.clone());
        compound.insert(Self::FIELD_DIGEST_PART1, part1);
        compound.insert(Self::FIELD_DIGEST_PART2, part2);
        compound.insert(Self::FIELD_POSTS, self.posts.clone());
        compound.insert(Self::FIELD_COMMENTS, self.comments.clone());
        compound
    }

    /// Rebuilds a profile from a record compound.
    ///
    /// Every required field must be present with the right type, and the
    /// text fields must still pass validation. Post and comment lists are
    /// optional and default to empty.
    pub fn from_compound(compound: &Compound) -> Result<Self, ProfileDecodeError> {
        let id = compound.get_u64(Self::FIELD_ID)?;
        let name = compound.get_str(Self::FIELD_NAME)?;
        let surname = compound.get_str(Self::FIELD_SURNAME)?;
        let email = compound.get_str(Self::FIELD_EMAIL)?;
        let part1 = compound.get_u64(Self::FIELD_DIGEST_PART1)?;
        let part2 = compound.get_u64(Self::FIELD_DIGEST_PART2)?;
        let posts = compound.get_u64_list_or_empty(Self::FIELD_POSTS)?;
        let comments = compound.get_u64_list_or_empty(Self::FIELD_COMMENTS)?;

        if !is_valid_name(name) {
            return Err(ProfileDecodeError::InvalidField { field: "name" });
        }
        if !is_valid_name(surname) {
            return Err(ProfileDecodeError::InvalidField { field: "surname" });
        }
        if !is_valid_email(email) {
            return Err(ProfileDecodeError::InvalidField { field: "email" });
        }

        Ok(Profile {
            id,
            name: name.to_string(),
            surname: surname.to_string(),
            email: email.to_string(),
            password: PasswordDigest::from_parts(part1, part2),
            posts: posts.to_vec(),
            comments: comments.to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_accept_latvian_letters() {
        assert!(is_valid_name("Jānis"));
        assert!(is_valid_name("Ozoliņš"));
        assert!(is_valid_name("  Anna  "));
    }

    #[test]
    fn names_reject_digits_punctuation_and_overflow() {
        assert!(!is_valid_name(""));
        assert!(!is_valid_name("   "));
        assert!(!is_valid_name("Anna2"));
        assert!(!is_valid_name("Anna-Marija"));
        assert!(!is_valid_name(&"a".repeat(MAX_NAME_LENGTH + 1)));
        assert!(is_valid_name(&"ā".repeat(MAX_NAME_LENGTH)));
    }

    #[test]
    fn emails_accept_the_usual_shapes() {
        assert!(is_valid_email("janis@example.com"));
        assert!(is_valid_email("j.ozolins@mail.example.lv"));
        assert!(is_valid_email("  user1@inbox.lv  "));
        assert!(is_valid_email("jānis@vēstule.lv"));
    }

    #[test]
    fn emails_need_exactly_one_at() {
        assert!(!is_valid_email("no-at-here.com"));
        assert!(!is_valid_email("a@b@c.com"));
    }

    #[test]
    fn emails_reject_adjacent_and_boundary_specials() {
        assert!(!is_valid_email("a..b@c.com"));
        assert!(!is_valid_email("a@.com"));
        assert!(!is_valid_email(".a@b.com"));
        assert!(!is_valid_email("a@b.com."));
        assert!(!is_valid_email("a@b.-com"));
    }

    #[test]
    fn emails_reject_forbidden_chars_and_overflow() {
        assert!(!is_valid_email("a b@c.com"));
        assert!(!is_valid_email("a+b@c.com"));
        let long_local = "a".repeat(MAX_EMAIL_LENGTH);
        assert!(!is_valid_email(&format!("{long_local}@c.com")));
    }

    #[test]
    fn suffix_list_is_a_whitelist_when_non_empty() {
        let suffixes = vec!["@inbox.lv".to_string(), "@example.com".to_string()];
        assert!(email_has_allowed_suffix("a@inbox.lv", &suffixes));
        assert!(!email_has_allowed_suffix("a@gmail.com", &suffixes));
        assert!(email_has_allowed_suffix("a@gmail.com", &[]));
    }

    #[test]
    fn password_is_length_checked_only() {
        assert!(!is_valid_password("abcd"));
        assert!(is_valid_password("abcde"));
        assert!(is_valid_password("p@$$ word 123 āžī"));
        assert!(is_valid_password(&"x".repeat(MAX_PASSWORD_LENGTH)));
        assert!(!is_valid_password(&"x".repeat(MAX_PASSWORD_LENGTH + 1)));
    }

    #[test]
    fn digest_is_deterministic_and_collision_averse() {
        let a = PasswordDigest::from_password("hunter2!");
        let b = PasswordDigest::from_password("hunter2!");
        let c = PasswordDigest::from_password("hunter3!");

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(a.parts().0, a.parts().1);
    }

    #[test]
    fn new_profile_validates_and_trims() {
        let profile = Profile::new(" Jānis ", "Ozoliņš", " janis@inbox.lv ", "secret1").unwrap();
        assert_eq!(profile.id(), UNVERIFIED_ID);
        assert_eq!(profile.name(), "Jānis");
        assert_eq!(profile.email(), "janis@inbox.lv");
        assert!(profile.verify_password("secret1"));
        assert!(!profile.verify_password("secret2"));

        assert!(Profile::new("J4nis", "Ozoliņš", "janis@inbox.lv", "secret1").is_none());
        assert!(Profile::new("Jānis", "Ozoliņš", "janis@inbox.lv", "shrt").is_none());
    }

    #[test]
    fn try_set_mutators_refuse_bad_input() {
        let mut profile = Profile::new("Anna", "Liepa", "anna@inbox.lv", "secret1").unwrap();

        assert!(!profile.set_name("Anna5"));
        assert_eq!(profile.name(), "Anna");

        assert!(profile.set_email("anna.liepa@inbox.lv"));
        assert_eq!(profile.email(), "anna.liepa@inbox.lv");

        assert!(!profile.set_password("tiny"));
        assert!(profile.verify_password("secret1"));
        assert!(profile.set_password("longer-secret"));
        assert!(profile.verify_password("longer-secret"));
    }

    #[test]
    fn compound_round_trip_preserves_everything() {
        let mut profile = Profile::new("Anna", "Liepa", "anna@inbox.lv", "secret1").unwrap();
        profile.assign_id(7);
        profile.add_post(100);
        profile.add_post(101);
        profile.add_comment(200);

        let restored = Profile::from_compound(&profile.to_compound()).unwrap();
        assert_eq!(restored, profile);
        assert!(restored.verify_password("secret1"));
    }

    #[test]
    fn from_compound_requires_every_scalar_field() {
        let mut compound = Profile::new("Anna", "Liepa", "anna@inbox.lv", "secret1")
            .unwrap()
            .to_compound();
        compound.remove(Profile::FIELD_EMAIL);

        assert!(matches!(
            Profile::from_compound(&compound),
            Err(ProfileDecodeError::Record(_))
        ));
    }

    #[test]
    fn from_compound_revalidates_text_fields() {
        let mut compound = Profile::new("Anna", "Liepa", "anna@inbox.lv", "secret1")
            .unwrap()
            .to_compound();
        compound.insert(Profile::FIELD_NAME, "not a name!");

        assert!(matches!(
            Profile::from_compound(&compound),
            Err(ProfileDecodeError::InvalidField { field: "name" })
        ));
    }

    #[test]
    fn post_and_comment_lists_default_to_empty() {
        let mut compound = Profile::new("Anna", "Liepa", "anna@inbox.lv", "secret1")
            .unwrap()
            .to_compound();
        compound.remove(Profile::FIELD_POSTS);
        compound.remove(Profile::FIELD_COMMENTS);

        let profile = Profile::from_compound(&compound).unwrap();
        assert!(profile.posts().is_empty());
        assert!(profile.comments().is_empty());
    }
}
