//! Service icons: a closed set of symbolic names, each with its own glyph.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum ServiceIcon {
    #[default]
    Shield,
    Lock,
    Server,
    Code,
    Database,
    Globe,
    Eye,
    Bug,
    Cloud,
    Key,
    Network,
    Fingerprint,
}

impl ServiceIcon {
    pub const ALL: [ServiceIcon; 12] = [
        ServiceIcon::Shield,
        ServiceIcon::Lock,
        ServiceIcon::Server,
        ServiceIcon::Code,
        ServiceIcon::Database,
        ServiceIcon::Globe,
        ServiceIcon::Eye,
        ServiceIcon::Bug,
        ServiceIcon::Cloud,
        ServiceIcon::Key,
        ServiceIcon::Network,
        ServiceIcon::Fingerprint,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ServiceIcon::Shield => "Shield",
            ServiceIcon::Lock => "Lock",
            ServiceIcon::Server => "Server",
            ServiceIcon::Code => "Code",
            ServiceIcon::Database => "Database",
            ServiceIcon::Globe => "Globe",
            ServiceIcon::Eye => "Eye",
            ServiceIcon::Bug => "Bug",
            ServiceIcon::Cloud => "Cloud",
            ServiceIcon::Key => "Key",
            ServiceIcon::Network => "Network",
            ServiceIcon::Fingerprint => "Fingerprint",
        }
    }

    /// Case-insensitive lookup; `None` for names outside the set.
    pub fn lookup(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL
            .into_iter()
            .find(|icon| icon.name().eq_ignore_ascii_case(name))
    }

    /// Never fails: unknown names resolve to the default glyph.
    pub fn resolve(name: &str) -> Self {
        Self::lookup(name).unwrap_or_default()
    }

    /// SVG path data (24x24 viewbox, stroke style).
    fn path(self) -> &'static str {
        match self {
            ServiceIcon::Shield => "M12 22s8-4 8-10V5l-8-3-8 3v7c0 6 8 10 8 10z",
            ServiceIcon::Lock => "M5 11h14v10H5z M8 11V7a4 4 0 0 1 8 0v4",
            ServiceIcon::Server => "M3 3h18v7H3z M3 14h18v7H3z M7 6.5h.01 M7 17.5h.01",
            ServiceIcon::Code => "M16 18l6-6-6-6 M8 6l-6 6 6 6",
            ServiceIcon::Database => {
                "M4 5c0-1.7 3.6-3 8-3s8 1.3 8 3-3.6 3-8 3-8-1.3-8-3z M4 5v14c0 1.7 3.6 3 8 3s8-1.3 8-3V5 M4 12c0 1.7 3.6 3 8 3s8-1.3 8-3"
            }
            ServiceIcon::Globe => {
                "M12 2a10 10 0 1 0 0 20 10 10 0 1 0 0-20z M2 12h20 M12 2a15 15 0 0 1 0 20 15 15 0 0 1 0-20z"
            }
            ServiceIcon::Eye => {
                "M1 12s4-8 11-8 11 8 11 8-4 8-11 8S1 12 1 12z M12 9a3 3 0 1 0 0 6 3 3 0 1 0 0-6z"
            }
            ServiceIcon::Bug => {
                "M8 6a4 4 0 0 1 8 0 M6 10h12v5a6 6 0 0 1-12 0z M12 10v11 M2 13h4 M18 13h4 M4 7l3 3 M20 7l-3 3"
            }
            ServiceIcon::Cloud => "M18 10h-1.3A8 8 0 1 0 9 20h9a5 5 0 0 0 0-10z",
            ServiceIcon::Key => {
                "M21 2l-2 2 M7.6 11.4a5.5 5.5 0 1 0 .01.01z M15.5 7.5l3 3L22 7l-3-3 M11 11l4-4"
            }
            ServiceIcon::Network => "M9 2h6v6H9z M2 16h6v6H2z M16 16h6v6h-6z M12 8v4 M5 16v-4h14v4",
            ServiceIcon::Fingerprint => {
                "M12 10a2 2 0 0 0-2 2c0 4 1 7 3 9 M8 21c-1-2-2-5-2-9a6 6 0 0 1 12 0c0 2 0 4-.5 6 M4 17c-.6-1.5-1-3.2-1-5a9 9 0 0 1 15-6.7"
            }
        }
    }

    pub fn svg(self) -> String {
        format!(
            r#"<svg class="icon icon-{}" xmlns="http://www.w3.org/2000/svg" viewBox="0 0 24 24" width="40" height="40" fill="none" stroke="currentColor" stroke-width="2" stroke-linecap="round" stroke-linejoin="round" aria-hidden="true"><path d="{}"/></svg>"#,
            self.name().to_lowercase(),
            self.path()
        )
    }
}

/// Canonical spelling for known names; unknown names are kept as given.
pub fn normalize_icon_name(name: &str) -> String {
    match ServiceIcon::lookup(name) {
        Some(icon) => icon.name().to_string(),
        None => {
            tracing::debug!(icon = %name, "unrecognized service icon, default glyph will render");
            name.trim().to_string()
        }
    }
}
