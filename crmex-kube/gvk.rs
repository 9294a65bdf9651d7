use kube::core::GroupVersionKind;

#[cfg(test)]
#[path = "./gvk.tests.rs"]
mod gvk_tests;

/// Possible errors from parsing resource type descriptors.
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum GvkError {
    /// Descriptor has no kind.
    #[error("resource type '{0}' has no kind")]
    MissingKind(String),

    /// Descriptor has no version.
    #[error("resource type '{0}' has no version, expected Kind.group/version")]
    MissingVersion(String),
}

/// Parses resource type descriptor written as `Kind.group/version`.\
/// **Note** that core types can be written as `Kind/version` or `Kind./version`.
pub fn parse_gvk(value: &str) -> Result<GroupVersionKind, GvkError> {
    let value = value.trim();
    let Some((kind_and_group, version)) = value.split_once('/') else {
        return Err(GvkError::MissingVersion(value.to_owned()));
    };

    if version.is_empty() || version.contains('/') {
        return Err(GvkError::MissingVersion(value.to_owned()));
    }

    let (kind, group) = kind_and_group.split_once('.').unwrap_or((kind_and_group, ""));
    if kind.is_empty() {
        return Err(GvkError::MissingKind(value.to_owned()));
    }

    Ok(GroupVersionKind::gvk(group, version, kind))
}

/// Returns api version of the resource type, `group/version` or just `version` for the core group.
pub fn api_version(gvk: &GroupVersionKind) -> String {
    if gvk.group.is_empty() {
        gvk.version.clone()
    } else {
        format!("{}/{}", gvk.group, gvk.version)
    }
}

/// Formats resource type in a human-readable way, e.g. `cache.example.com/v1alpha1, Kind=Memcached`.
pub fn format_gvk(gvk: &GroupVersionKind) -> String {
    format!("{}, Kind={}", api_version(gvk), gvk.kind)
}
