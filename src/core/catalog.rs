//! Application catalog: semantic categories and display names.
//!
//! Categorization is first-match-wins over an ordered table, so the order of
//! [`CATALOG`] and [`KEYWORDS`] is part of the behavior.

use serde::{Deserialize, Serialize};

/// Semantic category of an application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Category {
    Development,
    Databases,
    Office,
    Communication,
    Browsers,
    Entertainment,
    Creative,
    Utilities,
    System,
    /// Only reachable through keyword fallback
    Productivity,
    Other,
}

impl Category {
    /// Every category, in declaration order.
    pub const ALL: [Category; 11] = [
        Category::Development,
        Category::Databases,
        Category::Office,
        Category::Communication,
        Category::Browsers,
        Category::Entertainment,
        Category::Creative,
        Category::Utilities,
        Category::System,
        Category::Productivity,
        Category::Other,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Category::Development => "Development",
            Category::Databases => "Databases",
            Category::Office => "Office",
            Category::Communication => "Communication",
            Category::Browsers => "Browsers",
            Category::Entertainment => "Entertainment",
            Category::Creative => "Creative",
            Category::Utilities => "Utilities",
            Category::System => "System",
            Category::Productivity => "Productivity",
            Category::Other => "Other",
        }
    }

    /// Catalog entry for this category, if it has a known app list.
    pub fn info(&self) -> Option<&'static CategoryInfo> {
        CATALOG
            .iter()
            .find(|(category, _)| category == self)
            .map(|(_, info)| info)
    }

    pub fn emoji(&self) -> &'static str {
        self.info().map(|i| i.emoji).unwrap_or("📱")
    }

    pub fn color(&self) -> &'static str {
        self.info().map(|i| i.color).unwrap_or("#7f8c8d")
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Known applications and presentation metadata for a category.
#[derive(Debug)]
pub struct CategoryInfo {
    /// Executable names; matched as lower-cased substrings
    pub apps: &'static [&'static str],
    pub emoji: &'static str,
    pub color: &'static str,
}

/// Predefined categories, checked in order.
pub static CATALOG: &[(Category, CategoryInfo)] = &[
    (
        Category::Development,
        CategoryInfo {
            apps: &[
                "code.exe",
                "devenv.exe",
                "pycharm64.exe",
                "idea64.exe",
                "webstorm64.exe",
                "android studio.exe",
                "eclipse.exe",
                "sublime_text.exe",
                "atom.exe",
                "GitHubDesktop.exe",
                "SourceTree.exe",
                "postman.exe",
                "docker desktop.exe",
            ],
            emoji: "💻",
            color: "#2ecc71",
        },
    ),
    (
        Category::Databases,
        CategoryInfo {
            apps: &[
                "postgres.exe",
                "pgadmin4.exe",
                "mysql.exe",
                "mongodb.exe",
                "redis-server.exe",
            ],
            emoji: "🗄️",
            color: "#e67e22",
        },
    ),
    (
        Category::Office,
        CategoryInfo {
            apps: &[
                "WINWORD.EXE",
                "EXCEL.EXE",
                "POWERPNT.EXE",
                "OUTLOOK.EXE",
                "ONENOTE.EXE",
                "MSACCESS.EXE",
                "MSPUB.EXE",
                "AcroRd32.exe",
                "Acrobat.exe",
                "wps.exe",
                "et.exe",
                "wpp.exe",
            ],
            emoji: "💼",
            color: "#3498db",
        },
    ),
    (
        Category::Communication,
        CategoryInfo {
            apps: &[
                "teams.exe",
                "slack.exe",
                "discord.exe",
                "skype.exe",
                "telegram.exe",
                "whatsapp.exe",
                "signal.exe",
                "zoom.exe",
            ],
            emoji: "💬",
            color: "#9b59b6",
        },
    ),
    (
        Category::Browsers,
        CategoryInfo {
            apps: &[
                "chrome.exe",
                "firefox.exe",
                "msedge.exe",
                "opera.exe",
                "brave.exe",
                "safari.exe",
            ],
            emoji: "🌐",
            color: "#e74c3c",
        },
    ),
    (
        Category::Entertainment,
        CategoryInfo {
            apps: &[
                "spotify.exe",
                "netflix.exe",
                "steam.exe",
                "epicgameslauncher.exe",
                "vlc.exe",
                "wmplayer.exe",
            ],
            emoji: "🎮",
            color: "#f1c40f",
        },
    ),
    (
        Category::Creative,
        CategoryInfo {
            apps: &[
                "photoshop.exe",
                "illustrator.exe",
                "premiere.exe",
                "afterfx.exe",
                "lightroom.exe",
                "figma.exe",
                "sketch.exe",
                "blender.exe",
                "unity.exe",
                "unreal.exe",
            ],
            emoji: "🎨",
            color: "#1abc9c",
        },
    ),
    (
        Category::Utilities,
        CategoryInfo {
            apps: &[
                "notepad.exe",
                "notepad++.exe",
                "winrar.exe",
                "7zg.exe",
                "calc.exe",
                "mspaint.exe",
                "snippingtool.exe",
            ],
            emoji: "🔧",
            color: "#95a5a6",
        },
    ),
    (
        Category::System,
        CategoryInfo {
            apps: &[
                "taskmgr.exe",
                "control.exe",
                "cmd.exe",
                "powershell.exe",
                "WindowsTerminal.exe",
            ],
            emoji: "⚙️",
            color: "#34495e",
        },
    ),
];

/// Keyword fallback for applications missing from [`CATALOG`], checked in order.
pub static KEYWORDS: &[(Category, &[&str])] = &[
    (
        Category::Productivity,
        &["office", "doc", "sheet", "calc", "write", "edit", "note", "text"],
    ),
    (
        Category::Communication,
        &["chat", "mail", "message", "meet", "call", "voice", "team"],
    ),
    (Category::Browsers, &["browser", "web", "internet"]),
    (
        Category::Entertainment,
        &["game", "play", "media", "music", "video", "stream"],
    ),
    (
        Category::Development,
        &["code", "studio", "dev", "git", "ide", "debug", "compiler"],
    ),
    (
        Category::Creative,
        &["design", "photo", "art", "draw", "paint", "edit"],
    ),
    (
        Category::System,
        &["control", "panel", "setup", "config", "system", "task", "service"],
    ),
];

/// Map an application identifier to its category.
///
/// Known app names are matched as case-insensitive substrings of the
/// identifier, then keywords, then [`Category::Other`]. Never fails.
pub fn categorize(application_id: &str) -> Category {
    let app_lower = application_id.to_lowercase();

    let known = CATALOG.iter().find(|(_, info)| {
        info.apps
            .iter()
            .any(|app| app_lower.contains(&app.to_lowercase()))
    });
    if let Some((category, _)) = known {
        return *category;
    }

    KEYWORDS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| app_lower.contains(k)))
        .map(|(category, _)| *category)
        .unwrap_or(Category::Other)
}

/// Friendly labels for well-known executables.
static DISPLAY_NAMES: &[(&str, &str)] = &[
    ("chrome.exe", "🌐 Google Chrome"),
    ("firefox.exe", "🦊 Firefox"),
    ("msedge.exe", "🌐 Microsoft Edge"),
    ("opera.exe", "🌐 Opera"),
    ("brave.exe", "🦁 Brave"),
    ("Code.exe", "💻 Visual Studio Code"),
    ("devenv.exe", "🎯 Visual Studio"),
    ("pycharm64.exe", "🐍 PyCharm"),
    ("idea64.exe", "🧠 IntelliJ IDEA"),
    ("sublime_text.exe", "📝 Sublime Text"),
    ("GitHubDesktop.exe", "🐱 GitHub Desktop"),
    ("postman.exe", "📬 Postman"),
    ("docker desktop.exe", "🐳 Docker Desktop"),
    ("postgres.exe", "🐘 PostgreSQL"),
    ("pgadmin4.exe", "🐘 pgAdmin"),
    ("mysql.exe", "🐬 MySQL"),
    ("teams.exe", "👥 Microsoft Teams"),
    ("slack.exe", "💬 Slack"),
    ("discord.exe", "🎮 Discord"),
    ("zoom.exe", "📹 Zoom"),
    ("whatsapp.exe", "💬 WhatsApp"),
    ("telegram.exe", "✈️ Telegram"),
    ("WINWORD.EXE", "📝 Microsoft Word"),
    ("EXCEL.EXE", "📊 Microsoft Excel"),
    ("POWERPNT.EXE", "📽️ Microsoft PowerPoint"),
    ("OUTLOOK.EXE", "📧 Microsoft Outlook"),
    ("spotify.exe", "🎵 Spotify"),
    ("steam.exe", "🎮 Steam"),
    ("vlc.exe", "🎬 VLC"),
    ("photoshop.exe", "🎨 Photoshop"),
    ("figma.exe", "🎨 Figma"),
    ("lightroom.exe", "📸 Lightroom"),
    ("notepad.exe", "📝 Notepad"),
    ("WindowsTerminal.exe", "⌨️ Windows Terminal"),
];

/// Human-friendly label for an application. Presentation only.
pub fn display_name(application_id: &str) -> String {
    let known = DISPLAY_NAMES
        .iter()
        .find(|(id, _)| *id == application_id)
        .or_else(|| {
            DISPLAY_NAMES
                .iter()
                .find(|(id, _)| id.eq_ignore_ascii_case(application_id))
        });
    if let Some((_, name)) = known {
        return (*name).to_string();
    }

    let stem = application_id
        .strip_suffix(".exe")
        .or_else(|| application_id.strip_suffix(".EXE"))
        .unwrap_or(application_id);
    let words: Vec<String> = stem.split('_').map(capitalize).collect();
    format!("📱 {}", words.join(" "))
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(|c| c.to_lowercase())).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_apps_any_casing() {
        for (category, info) in CATALOG {
            for app in info.apps {
                // Substring matching means an earlier category may claim an
                // app that contains one of its names; skip those.
                let expected = categorize(app);
                assert_eq!(categorize(&app.to_uppercase()), expected);
                assert_eq!(categorize(&app.to_lowercase()), expected);
                if expected != *category {
                    let earlier = CATALOG
                        .iter()
                        .position(|(c, _)| *c == expected)
                        .unwrap();
                    let own = CATALOG.iter().position(|(c, _)| c == category).unwrap();
                    assert!(earlier < own, "{app} matched a later category");
                }
            }
        }
        assert_eq!(categorize("Chrome.EXE"), Category::Browsers);
        assert_eq!(categorize("winword.exe"), Category::Office);
        assert_eq!(categorize("C:/Program Files/Slack/slack.exe"), Category::Communication);
    }

    #[test]
    fn test_keyword_fallback() {
        assert_eq!(categorize("dev.exe"), Category::Development);
        assert_eq!(categorize("game.exe"), Category::Entertainment);
        assert_eq!(categorize("mailbird.exe"), Category::Communication);
        assert_eq!(categorize("webview.exe"), Category::Browsers);
        // "edit" appears for both Productivity and Creative; Productivity is first
        assert_eq!(categorize("photoedit.exe"), Category::Productivity);
        assert_eq!(categorize("setup.exe"), Category::System);
    }

    #[test]
    fn test_unknown_is_other() {
        assert_eq!(categorize("zzz.exe"), Category::Other);
        assert_eq!(categorize(""), Category::Other);
    }

    #[test]
    fn test_category_metadata() {
        assert_eq!(Category::Browsers.emoji(), "🌐");
        assert_eq!(Category::Development.color(), "#2ecc71");
        assert_eq!(Category::Other.emoji(), "📱");
        assert!(Category::Productivity.info().is_none());
    }

    #[test]
    fn test_display_names() {
        assert_eq!(display_name("chrome.exe"), "🌐 Google Chrome");
        assert_eq!(display_name("code.exe"), "💻 Visual Studio Code");
        assert_eq!(display_name("my_cool_tool.exe"), "📱 My Cool Tool");
        assert_eq!(display_name("htop"), "📱 Htop");
    }
}
