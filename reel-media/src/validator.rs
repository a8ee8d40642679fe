use crate::probe::sniff;
use crate::{IngestPolicy, MediaType, PolicyProfile, PolicySet, ValidationError};

/// Everything the validator looks at. `sniffed` and `duration_secs` come
/// from inspecting the bytes, never from the client.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadFacts {
    pub declared_mime: String,
    pub sniffed: Option<MediaType>,
    pub size_bytes: u64,
    pub duration_secs: Option<f64>,
}

/// Pure policy checks. Has no side effects and never touches storage.
#[derive(Debug, Clone, Default)]
pub struct IngestValidator {
    policies: PolicySet,
}

impl IngestValidator {
    pub fn new(policies: PolicySet) -> Self {
        Self { policies }
    }

    pub fn policy(&self, profile: PolicyProfile) -> &IngestPolicy {
        self.policies.get(profile)
    }

    pub fn policies(&self) -> &PolicySet {
        &self.policies
    }

    /// The first rule on its own, for transports that want to refuse a
    /// body before reading it.
    pub fn check_declared_type(
        &self,
        profile: PolicyProfile,
        declared_mime: &str,
    ) -> Result<MediaType, ValidationError> {
        MediaType::from_mime(declared_mime)
            .filter(|t| self.policy(profile).allows(*t))
            .ok_or_else(|| ValidationError::unsupported(declared_mime))
    }

    /// The whole type rule: declared and sniffed types are both allowed and
    /// share a container family. Returns the sniffed type.
    pub fn check_type(
        &self,
        profile: PolicyProfile,
        declared_mime: &str,
        sniffed: Option<MediaType>,
    ) -> Result<MediaType, ValidationError> {
        let policy = self.policy(profile);
        let declared = self.check_declared_type(profile, declared_mime)?;
        sniffed
            .filter(|t| policy.allows(*t) && t.container() == declared.container())
            .ok_or_else(|| ValidationError::unsupported(declared_mime))
    }

    /// Picks the error for a body that crossed the size cap while being
    /// spooled. The type rule ranks first, so a `head` that already fails
    /// it is reported as such instead of `overflow`.
    pub fn rank_overflow(
        &self,
        profile: PolicyProfile,
        declared_mime: &str,
        head: &[u8],
        overflow: ValidationError,
    ) -> ValidationError {
        match self.check_type(profile, declared_mime, sniff(head)) {
            Ok(_) => overflow,
            Err(unsupported) => unsupported,
        }
    }

    /// Applies, in order: type allow-list (declared and sniffed must agree),
    /// size limit, then video duration limit. Returns the sniffed type.
    pub fn validate(
        &self,
        profile: PolicyProfile,
        facts: &UploadFacts,
    ) -> Result<MediaType, ValidationError> {
        let policy = self.policy(profile);
        let actual = self.check_type(profile, &facts.declared_mime, facts.sniffed)?;

        if facts.size_bytes > policy.max_bytes {
            return Err(ValidationError::TooLarge {
                size_bytes: facts.size_bytes,
                max_bytes: policy.max_bytes,
            });
        }

        if actual.is_video() {
            if let Some(max) = policy.max_duration {
                match facts.duration_secs {
                    // A limit we cannot check is a container we cannot read.
                    None => return Err(ValidationError::unsupported(actual.mime())),
                    Some(secs) if secs > max.as_secs_f64() => {
                        return Err(ValidationError::TooLong {
                            duration_secs: secs,
                            max_secs: max.as_secs(),
                        });
                    }
                    Some(_) => {}
                }
            }
        }

        Ok(actual)
    }
}
