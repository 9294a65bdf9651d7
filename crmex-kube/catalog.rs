use k8s_openapi::apimachinery::pkg::apis::meta::v1::{APIResource, APIResourceList};
use kube::Client;
use kube::api::ApiResource;
use kube::core::GroupVersionKind;

use crate::{api_version, format_gvk};

#[cfg(test)]
#[path = "./catalog.tests.rs"]
mod catalog_tests;

pub type ApiResourceLists = Vec<APIResourceList>;

/// Possible errors from resource catalog lookups.
#[derive(thiserror::Error, Debug)]
pub enum CatalogError {
    /// Resource type is not served by the Kubernetes API server.
    #[error("unable to find type: {0} in server")]
    TypeNotFound(String),

    /// Kubernetes API request failed.
    #[error(transparent)]
    KubeError(#[from] kube::Error),
}

/// Fetches resource catalog for every distinct group version of the provided resource types.\
/// **Note** that group versions not served by the API server are skipped.
pub async fn get_api_resource_lists(client: &Client, gvks: &[GroupVersionKind]) -> Result<ApiResourceLists, CatalogError> {
    let mut group_versions = Vec::<(&str, String)>::with_capacity(gvks.len());
    for gvk in gvks {
        let api_version = api_version(gvk);
        if !group_versions.iter().any(|(_, gv)| *gv == api_version) {
            group_versions.push((gvk.group.as_str(), api_version));
        }
    }

    let mut lists = Vec::with_capacity(group_versions.len());
    for (group, group_version) in group_versions {
        tracing::debug!("Fetching resource catalog for {}", group_version);
        let result = if group.is_empty() {
            client.list_core_api_resources(&group_version).await
        } else {
            client.list_api_group_resources(&group_version).await
        };

        match result {
            Ok(list) => lists.push(list),
            Err(kube::Error::Api(response)) if response.code == 404 => {
                tracing::warn!("Group version {} is not served by the API server", group_version);
            },
            Err(error) => return Err(error.into()),
        }
    }

    Ok(lists)
}

/// Returns `true` if the resource type is namespaced according to the resource catalog.
pub fn is_namespaced(gvk: &GroupVersionKind, lists: &[APIResourceList]) -> Result<bool, CatalogError> {
    find_resource(gvk, lists, |_| true)
        .map(|resource| resource.namespaced)
        .ok_or_else(|| CatalogError::TypeNotFound(format_gvk(gvk)))
}

/// Builds [`ApiResource`] for the resource type using plural name from the resource catalog.
pub fn find_api_resource(gvk: &GroupVersionKind, lists: &[APIResourceList]) -> Result<ApiResource, CatalogError> {
    find_resource(gvk, lists, |resource| !resource.name.contains('/'))
        .map(|resource| ApiResource::from_gvk_with_plural(gvk, &resource.name))
        .ok_or_else(|| CatalogError::TypeNotFound(format_gvk(gvk)))
}

fn find_resource<'a>(
    gvk: &GroupVersionKind,
    lists: &'a [APIResourceList],
    filter: impl Fn(&APIResource) -> bool,
) -> Option<&'a APIResource> {
    let api_version = api_version(gvk);
    lists
        .iter()
        .filter(|list| list.group_version == api_version)
        .flat_map(|list| list.resources.iter())
        .find(|resource| resource.kind == gvk.kind && filter(resource))
}
