//! URL templates for Vultr endpoints.
//!
//! Templates are relative to the API base URL and name their path parameters
//! in braces, e.g. `instances/{instance-id}`. Only a handful of commonly used
//! endpoints are listed; any other path can be written as a template or passed
//! to [`Client::request`](crate::Client::request) directly.

use std::borrow::Cow;

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::{Error, Result};

/// Everything but RFC 3986 unreserved characters is escaped, so an assigned
/// value always stays a single path segment.
const SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// A path template with `{placeholder}` segments.
///
/// # Examples
///
/// ```
/// use vultr_rest::endpoints::INSTANCE_IPV4_REVERSE_DEFAULT;
///
/// # fn example() -> Result<(), vultr_rest::Error> {
/// let path = INSTANCE_IPV4_REVERSE_DEFAULT
///     .assign("instance-id", "cb676a46-66fd-4dfb-b839-443f2e6c0b60")
///     .path()?;
///
/// assert_eq!(
///     path,
///     "instances/cb676a46-66fd-4dfb-b839-443f2e6c0b60/ipv4/reverse/default"
/// );
///
/// // Forgetting a parameter is caught before any request is made.
/// assert!(INSTANCE_IPV4_REVERSE_DEFAULT.path().is_err());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlTemplate {
    template: Cow<'static, str>,
}

impl UrlTemplate {
    /// Creates a template from a static path.
    pub const fn new(template: &'static str) -> Self {
        Self {
            template: Cow::Borrowed(template),
        }
    }

    /// Substitutes every `{placeholder}` occurrence with `value`.
    ///
    /// The value is percent-encoded as one path segment: `/`, `?`, `#` and
    /// `%` cannot change the shape of the path.
    pub fn assign(&self, placeholder: &str, value: impl AsRef<str>) -> Self {
        let token = format!("{{{}}}", placeholder);
        let segment = utf8_percent_encode(value.as_ref(), SEGMENT).to_string();
        Self {
            template: Cow::Owned(self.template.replace(&token, &segment)),
        }
    }

    /// The template text as currently resolved.
    pub fn as_str(&self) -> &str {
        &self.template
    }

    /// The resolved path.
    ///
    /// # Errors
    ///
    /// Returns an error if a placeholder has not been assigned, or if a
    /// segment resolved to `.` or `..`.
    pub fn path(&self) -> Result<String> {
        if let Some(start) = self.template.find('{') {
            let rest = &self.template[start..];
            let end = rest.find('}').map(|i| i + 1).unwrap_or(rest.len());
            return Err(Error::ConfigurationError(format!(
                "Unresolved URL placeholder {} in {}",
                &rest[..end],
                self.template
            )));
        }
        if self.template.split('/').any(|s| s == "." || s == "..") {
            return Err(Error::ConfigurationError(format!(
                "Dot segment in URL path {}",
                self.template
            )));
        }
        Ok(self.template.to_string())
    }
}

/// Default API base URL.
pub const BASE_URL: &str = "https://api.vultr.com/v2/";

pub const ACCOUNT: UrlTemplate = UrlTemplate::new("account");
pub const ACCOUNT_BANDWIDTH: UrlTemplate = UrlTemplate::new("account/bandwidth");
pub const REGIONS: UrlTemplate = UrlTemplate::new("regions");
pub const REGION_AVAILABILITY: UrlTemplate = UrlTemplate::new("regions/{region-id}/availability");
pub const PLANS: UrlTemplate = UrlTemplate::new("plans");
pub const OS: UrlTemplate = UrlTemplate::new("os");

pub const INSTANCES: UrlTemplate = UrlTemplate::new("instances");
pub const INSTANCE: UrlTemplate = UrlTemplate::new("instances/{instance-id}");
pub const INSTANCES_START: UrlTemplate = UrlTemplate::new("instances/start");
pub const INSTANCES_REBOOT: UrlTemplate = UrlTemplate::new("instances/reboot");
pub const INSTANCES_HALT: UrlTemplate = UrlTemplate::new("instances/halt");
pub const INSTANCE_REINSTALL: UrlTemplate = UrlTemplate::new("instances/{instance-id}/reinstall");
pub const INSTANCE_BANDWIDTH: UrlTemplate = UrlTemplate::new("instances/{instance-id}/bandwidth");
pub const INSTANCE_IPV4: UrlTemplate = UrlTemplate::new("instances/{instance-id}/ipv4");
pub const INSTANCE_IPV4_REVERSE_DEFAULT: UrlTemplate =
    UrlTemplate::new("instances/{instance-id}/ipv4/reverse/default");

pub const SSH_KEYS: UrlTemplate = UrlTemplate::new("ssh-keys");
pub const SSH_KEY: UrlTemplate = UrlTemplate::new("ssh-keys/{ssh-key-id}");
pub const SNAPSHOTS: UrlTemplate = UrlTemplate::new("snapshots");
pub const SNAPSHOT: UrlTemplate = UrlTemplate::new("snapshots/{snapshot-id}");
pub const BLOCKS: UrlTemplate = UrlTemplate::new("blocks");
pub const BLOCK: UrlTemplate = UrlTemplate::new("blocks/{block-id}");
pub const BLOCK_ATTACH: UrlTemplate = UrlTemplate::new("blocks/{block-id}/attach");
pub const BLOCK_DETACH: UrlTemplate = UrlTemplate::new("blocks/{block-id}/detach");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assign_replaces_every_occurrence() {
        let template = UrlTemplate::new("a/{id}/b/{id}");
        assert_eq!(template.assign("id", "x").path().unwrap(), "a/x/b/x");
    }

    #[test]
    fn test_assign_does_not_mutate_constant() {
        let resolved = SSH_KEY.assign("ssh-key-id", "k1");
        assert_eq!(resolved.as_str(), "ssh-keys/k1");
        assert_eq!(SSH_KEY.as_str(), "ssh-keys/{ssh-key-id}");
    }

    #[test]
    fn test_unresolved_placeholder() {
        let err = BLOCK_ATTACH.path().unwrap_err();
        assert!(err.to_string().contains("{block-id}"));

        let wrong = BLOCK_ATTACH.assign("instance-id", "i1");
        assert!(wrong.path().is_err());
    }

    #[test]
    fn test_assigned_value_stays_one_segment() {
        let path = SSH_KEY.assign("ssh-key-id", "../account?x=1#frag").path().unwrap();
        assert_eq!(path, "ssh-keys/..%2Faccount%3Fx%3D1%23frag");

        let path = SSH_KEY.assign("ssh-key-id", "50%").path().unwrap();
        assert_eq!(path, "ssh-keys/50%25");

        let path = INSTANCE.assign("instance-id", "cb676a46-66fd_4dfb.b839~x").path().unwrap();
        assert_eq!(path, "instances/cb676a46-66fd_4dfb.b839~x");
    }

    #[test]
    fn test_dot_segments_are_rejected() {
        assert!(INSTANCE.assign("instance-id", "..").path().is_err());
        assert!(INSTANCE.assign("instance-id", ".").path().is_err());
        assert!(BLOCK_ATTACH.assign("block-id", "..").path().is_err());
    }

    #[test]
    fn test_assigned_braces_are_not_placeholders() {
        let path = INSTANCE.assign("instance-id", "{x}").path().unwrap();
        assert_eq!(path, "instances/%7Bx%7D");
    }

    #[test]
    fn test_plain_path() {
        assert_eq!(INSTANCES.path().unwrap(), "instances");
    }
}
