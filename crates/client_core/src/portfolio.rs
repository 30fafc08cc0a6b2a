use serde::Serialize;
use shared::{
    domain::{CanonicalCategory, CanonicalProject},
    protocol::Envelope,
};

use crate::ui::Viewport;

pub const ALL_CATEGORIES_ID: &str = "all";
pub const ALL_CATEGORIES_LABEL: &str = "All";
/// Breakpoint configuration the portfolio grid is laid out with.
pub const THREE_PER_ROW_BREAKPOINTS: &str = "swiper-breakpoints-three-slides";

#[derive(Debug, Clone, PartialEq, Default)]
pub enum PortfolioState {
    #[default]
    Loading,
    Ready(Portfolio),
    Failed(String),
}

impl PortfolioState {
    /// Combines the two list results. Projects are checked first; the first
    /// failure wins and any successful half is discarded.
    pub fn from_envelopes(
        projects: Envelope<Vec<CanonicalProject>>,
        categories: Envelope<Vec<CanonicalCategory>>,
    ) -> Self {
        if !projects.success {
            return Self::Failed(format!(
                "Failed to fetch projects: {}",
                projects.error.unwrap_or_default()
            ));
        }
        if !categories.success {
            return Self::Failed(format!(
                "Failed to fetch categories: {}",
                categories.error.unwrap_or_default()
            ));
        }
        Self::Ready(Portfolio {
            projects: projects.data,
            categories: categories.data,
        })
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Failed(error) => Some(error),
            _ => None,
        }
    }

    /// Projects to display; empty unless the load fully succeeded.
    pub fn projects(&self) -> &[CanonicalProject] {
        match self {
            Self::Ready(portfolio) => &portfolio.projects,
            _ => &[],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Portfolio {
    pub projects: Vec<CanonicalProject>,
    pub categories: Vec<CanonicalCategory>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryFilter {
    pub id: String,
    pub label: String,
    pub name: String,
}

impl Portfolio {
    pub fn project_count(&self, category: &str) -> usize {
        self.projects
            .iter()
            .filter(|project| project.in_category(category))
            .count()
    }

    /// Filter entries for the category picker: `All` followed by one entry
    /// per category, keyed by name. Empty when there are no categories.
    pub fn category_filters(&self) -> Vec<CategoryFilter> {
        if self.categories.is_empty() {
            return Vec::new();
        }

        let mut filters = Vec::with_capacity(self.categories.len() + 1);
        filters.push(CategoryFilter {
            id: ALL_CATEGORIES_ID.into(),
            label: ALL_CATEGORIES_LABEL.into(),
            name: ALL_CATEGORIES_LABEL.into(),
        });
        filters.extend(self.categories.iter().map(|category| CategoryFilter {
            id: category.name.clone(),
            label: format!(
                "{} ({})",
                category.name,
                self.project_count(&category.name)
            ),
            name: category.name.clone(),
        }));
        filters
    }

    pub fn filter_projects(&self, selected: Option<&str>) -> Vec<&CanonicalProject> {
        match selected {
            None | Some(ALL_CATEGORIES_ID) => self.projects.iter().collect(),
            Some(name) => self
                .projects
                .iter()
                .filter(|project| project.in_category(name))
                .collect(),
        }
    }
}

/// Subtitle line for a project card, falling back to its category names.
pub fn display_subtitle(project: &CanonicalProject) -> String {
    if !project.subtitle.is_empty() {
        return project.subtitle.clone();
    }
    project
        .categories
        .iter()
        .map(|category| category.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProjectBadge {
    pub icon: &'static str,
    pub background: &'static str,
    pub foreground: &'static str,
}

struct BadgeRule {
    title_keywords: &'static [&'static str],
    category_keywords: &'static [&'static str],
    icon: &'static str,
    background: &'static str,
}

const BADGE_FOREGROUND: &str = "#fff";

const BADGE_RULES: [BadgeRule; 7] = [
    BadgeRule {
        title_keywords: &["lms"],
        category_keywords: &["lms"],
        icon: "fa-solid fa-graduation-cap",
        background: "#007bff",
    },
    BadgeRule {
        title_keywords: &["ecommerce", "shop"],
        category_keywords: &["ecommerce"],
        icon: "fa-solid fa-shopping-cart",
        background: "#dc3545",
    },
    BadgeRule {
        title_keywords: &["wordpress"],
        category_keywords: &["wordpress"],
        icon: "fa-brands fa-wordpress",
        background: "#21759b",
    },
    BadgeRule {
        title_keywords: &["web", "app"],
        category_keywords: &["web"],
        icon: "fa-solid fa-globe",
        background: "#28a745",
    },
    BadgeRule {
        title_keywords: &["mobile"],
        category_keywords: &[],
        icon: "fa-solid fa-mobile-alt",
        background: "#6f42c1",
    },
    BadgeRule {
        title_keywords: &["api", "backend"],
        category_keywords: &[],
        icon: "fa-solid fa-server",
        background: "#fd7e14",
    },
    BadgeRule {
        title_keywords: &["ui", "design"],
        category_keywords: &[],
        icon: "fa-solid fa-palette",
        background: "#e83e8c",
    },
];

const DEFAULT_BADGE: ProjectBadge = ProjectBadge {
    icon: "fa-solid fa-code",
    background: "#6c757d",
    foreground: BADGE_FOREGROUND,
};

/// Icon and colours for a project card, picked by keyword on the title and
/// then the category names. The first matching rule wins.
pub fn project_badge(project: &CanonicalProject) -> ProjectBadge {
    let title = project.title.to_lowercase();
    let categories: Vec<String> = project
        .categories
        .iter()
        .map(|category| category.name.to_lowercase())
        .collect();

    BADGE_RULES
        .iter()
        .find(|rule| {
            rule.title_keywords
                .iter()
                .any(|keyword| title.contains(keyword))
                || rule.category_keywords.iter().any(|keyword| {
                    categories
                        .iter()
                        .any(|category| category.contains(keyword))
                })
        })
        .map(|rule| ProjectBadge {
            icon: rule.icon,
            background: rule.background,
            foreground: BADGE_FOREGROUND,
        })
        .unwrap_or(DEFAULT_BADGE)
}

pub fn items_per_row(viewport: &dyn Viewport) -> usize {
    viewport
        .items_per_row(THREE_PER_ROW_BREAKPOINTS)
        .filter(|count| *count > 0)
        .unwrap_or(1)
}

#[cfg(test)]
#[path = "tests/portfolio_tests.rs"]
mod tests;
