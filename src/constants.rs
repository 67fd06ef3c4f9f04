// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

/// ConfigMap annotation keys read by the controller
pub mod annotations {
    /// Common prefix of every annotation the controller reads
    pub const PREFIX: &str = "grafana.net/";
    /// Grafana instance id the ConfigMap targets
    pub const ID: &str = "grafana.net/id";
    /// When true, every data entry is a dashboard
    pub const DASHBOARD: &str = "grafana.net/dashboard";
    /// When true, every data entry is a datasource
    pub const DATASOURCE: &str = "grafana.net/datasource";
    /// When true, every data entry is an alert notification channel
    pub const NOTIFICATION_CHANNEL: &str = "grafana.net/notification-channel";
    /// Folder name for dashboards, or "true" to use the ConfigMap namespace
    pub const FOLDER: &str = "grafana.net/folder";
}

/// Grafana HTTP API paths
pub mod api {
    pub const SEARCH: &str = "/api/search";
    pub const DASHBOARDS_DB: &str = "/api/dashboards/db";
    pub const DASHBOARDS_UID: &str = "/api/dashboards/uid";
    pub const DATASOURCES: &str = "/api/datasources";
    pub const DATASOURCES_NAME: &str = "/api/datasources/name";
    pub const ALERT_NOTIFICATIONS: &str = "/api/alert-notifications";
    pub const FOLDERS: &str = "/api/folders";
    pub const ADMIN_USERS: &str = "/api/admin/users";
}

/// Search result type marker for regular dashboards
pub const DASHBOARD_TYPE_DB: &str = "dash-db";

/// Id assigned by identity resolution when no remote record matches
pub const NOT_FOUND_ID: i64 = -1;

/// Folder id of the root ("General") folder
pub const ROOT_FOLDER_ID: i64 = 0;

/// Retry configuration for a Grafana instance that is not accepting connections yet
pub mod retry {
    /// Fixed delay between attempts in seconds
    pub const INTERVAL_SECS: u64 = 8;
}

/// Monitoring user created on startup when a password is configured
pub mod monitoring_user {
    pub const NAME: &str = "Monitoring";
    pub const LOGIN: &str = "monitoring";
    pub const ROLE: &str = "Viewer";
}
