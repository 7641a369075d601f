//! HTML element ids exposed to page templates.
//!
//! Templates refer to elements by constant name (`{{PROFILE_SAVE_BUTTON}}`)
//! and the value is always derived from that name, so pages and scripts
//! agree on ids without a second table.

use std::collections::BTreeMap;

/// Element constants shared by the main app pages.
const ELEMENTS: &[&str] = &[
    "ERROR_MESSAGE",
    "ERROR_MODAL",
    "MAIN_APP_CONNECTION_LOSS_NOTIFICATION",
    "MAIN_PAGE_LOGOUT_BUTTON",
    "MAIN_PAGE_MEMBER_STATUS_LIST",
    "MAIN_PAGE_PROFILE_BUTTON",
    "MAIN_PAGE_STATUS_SELECT",
    "MAIN_PAGE_SUMMARY_BUTTON",
    "PROFILE_ABOUT_ME_INPUT",
    "PROFILE_ADDRESS_INPUT",
    "PROFILE_CITY_INPUT",
    "PROFILE_COUNTRY_INPUT",
    "PROFILE_EMAIL_INPUT",
    "PROFILE_FIRST_NAME_INPUT",
    "PROFILE_LAST_NAME_INPUT",
    "PROFILE_MAIN_FORM",
    "PROFILE_POSTAL_CODE_INPUT",
    "PROFILE_SAVE_BUTTON",
    "PROFILE_USERNAME_INPUT",
    "THREAD_LIST_CONTAINER",
    "THREAD_NEW_BUTTON",
    "THREAD_NEW_THREAD_NAME",
];

/// Page containers of the main app.
const PAGES: &[&str] = &["APP_PROFILE_PAGE", "APP_SUMMARY_PAGE"];

/// `PROFILE_SAVE_BUTTON` -> `profile-save-button`
pub fn element_id(constant: &str) -> String {
    constant.to_lowercase().replace('_', "-")
}

/// Every constant with its element id.
pub fn html_ids() -> BTreeMap<&'static str, String> {
    ELEMENTS
        .iter()
        .chain(PAGES)
        .map(|constant| (*constant, element_id(constant)))
        .collect()
}

/// Render context for pages: the id table as a JSON object.
pub fn page_context() -> serde_json::Value {
    serde_json::Value::Object(
        html_ids()
            .into_iter()
            .map(|(constant, id)| (constant.to_string(), serde_json::Value::String(id)))
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_id_follows_the_naming_rule() {
        for (constant, id) in html_ids() {
            assert_eq!(id, constant.to_lowercase().replace('_', "-"));
            assert!(!id.contains('_'), "{constant} -> {id}");
        }
    }

    #[test]
    fn test_pages_are_included() {
        let ids = html_ids();
        assert_eq!(ids["APP_PROFILE_PAGE"], "app-profile-page");
        assert_eq!(ids["PROFILE_SAVE_BUTTON"], "profile-save-button");
        assert_eq!(ids.len(), ELEMENTS.len() + PAGES.len());
    }

    #[test]
    fn test_page_context_is_flat_object() {
        let context = page_context();
        assert_eq!(context["THREAD_NEW_BUTTON"], "thread-new-button");
    }
}
