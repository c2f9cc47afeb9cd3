//! User-facing feedback strings.
//!
//! Defaults mirror the stock updater wording; hosts override individual
//! fields to match their product copy or to route through a translation
//! layer. Templates use `%s`-style placeholders filled by the helper
//! methods, so overridden copy keeps working.

/// Message table consumed by the license client and update checker.
#[derive(Debug, Clone)]
pub struct UpdaterStrings {
    pub theme_license: String,
    pub enter_key: String,
    pub license_key: String,
    pub license_action: String,
    pub deactivate_license: String,
    pub activate_license: String,
    pub renew: String,
    pub unlimited: String,
    pub license_key_is_active: String,
    /// Template: `%s` is the formatted expiry date.
    pub expires: String,
    pub expires_never: String,
    /// Template: `%1$s` is the active site count, `%2$s` the limit.
    pub sites_activated: String,
    pub license_key_expired: String,
    pub license_keys_do_not_match: String,
    pub license_is_inactive: String,
    pub license_key_is_disabled: String,
    pub site_is_inactive: String,
    pub license_status_unknown: String,
    pub try_again: String,
    /// Confirmation prompt shown before the host runs the update.
    pub update_notice: String,
    /// Template: `%1$s` theme name, `%2$s` new version.
    pub update_available: String,
    pub no_changelog: String,
}

impl Default for UpdaterStrings {
    fn default() -> Self {
        Self {
            theme_license: "Theme License".to_string(),
            enter_key: "Enter your theme license key.".to_string(),
            license_key: "License Key".to_string(),
            license_action: "License Action".to_string(),
            deactivate_license: "Deactivate License".to_string(),
            activate_license: "Activate License".to_string(),
            renew: "Renew?".to_string(),
            unlimited: "unlimited".to_string(),
            license_key_is_active: "License key is active.".to_string(),
            expires: "Expires %s.".to_string(),
            expires_never: "Lifetime License.".to_string(),
            sites_activated: "You have %1$s / %2$s sites activated.".to_string(),
            license_key_expired: "License key has expired.".to_string(),
            license_keys_do_not_match: "License keys do not match.".to_string(),
            license_is_inactive: "License is inactive.".to_string(),
            license_key_is_disabled: "License key is disabled.".to_string(),
            site_is_inactive: "Site is inactive.".to_string(),
            license_status_unknown: "License status is unknown.".to_string(),
            try_again: "An error occurred, please try again.".to_string(),
            update_notice: "Updating this theme will lose any customizations you have made. \
                            'Cancel' to stop, 'OK' to update."
                .to_string(),
            update_available: "%1$s %2$s is available.".to_string(),
            no_changelog: "No changelog has been found.".to_string(),
        }
    }
}

impl UpdaterStrings {
    /// "Expires <date>." with the formatted expiry filled in.
    pub fn expires_on(&self, date: &str) -> String {
        self.expires.replace("%s", date)
    }

    /// Site-usage summary, e.g. "You have 2 / 5 sites activated.".
    pub fn sites_summary(&self, site_count: u32, limit: &str) -> String {
        self.sites_activated
            .replacen("%1$s", &site_count.to_string(), 1)
            .replacen("%2$s", limit, 1)
    }

    /// Banner headline, e.g. "Aurora 2.1.0 is available.".
    pub fn update_headline(&self, theme_name: &str, new_version: &str) -> String {
        self.update_available
            .replacen("%1$s", theme_name, 1)
            .replacen("%2$s", new_version, 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expires_template_fills_date() {
        let strings = UpdaterStrings::default();
        assert_eq!(
            strings.expires_on("November 20, 2026"),
            "Expires November 20, 2026."
        );
    }

    #[test]
    fn sites_summary_fills_both_slots() {
        let strings = UpdaterStrings::default();
        assert_eq!(
            strings.sites_summary(2, "5"),
            "You have 2 / 5 sites activated."
        );
        assert_eq!(
            strings.sites_summary(3, "unlimited"),
            "You have 3 / unlimited sites activated."
        );
    }

    #[test]
    fn update_headline_fills_name_and_version() {
        let strings = UpdaterStrings::default();
        assert_eq!(
            strings.update_headline("Aurora", "2.1.0"),
            "Aurora 2.1.0 is available."
        );
    }

    #[test]
    fn overridden_copy_keeps_templates_working() {
        let strings = UpdaterStrings {
            expires: "Valid until %s!".to_string(),
            ..UpdaterStrings::default()
        };
        assert_eq!(strings.expires_on("June 1, 2027"), "Valid until June 1, 2027!");
    }
}
