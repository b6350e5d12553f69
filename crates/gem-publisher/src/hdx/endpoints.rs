//! CKAN action API URL builders

/// Build the URL of a CKAN action, e.g. `{base}/api/3/action/package_create`
pub fn action_url(base_url: &str, action: &str) -> String {
    format!("{}/api/3/action/{}", base_url, action)
}

/// Build package_show URL for a dataset name or id
pub fn package_show_url(base_url: &str, name_or_id: &str) -> String {
    format!(
        "{}?id={}",
        action_url(base_url, "package_show"),
        urlencoding::encode(name_or_id)
    )
}

/// Build the URL listing organisations the current user can create datasets in
pub fn organization_list_for_user_url(base_url: &str) -> String {
    format!(
        "{}?permission=create_dataset",
        action_url(base_url, "organization_list_for_user")
    )
}

/// Public dataset page, shown in the run summary
pub fn dataset_page_url(base_url: &str, name: &str) -> String {
    format!("{}/dataset/{}", base_url, name)
}
