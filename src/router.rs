//! View routing between login, dashboard, survey and journey detail.

use serde::Serialize;
use tracing::debug;

const HISTORY_LIMIT: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Login,
    Dashboard,
    Survey,
    Journey,
}

impl View {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "login" => Some(Self::Login),
            "dashboard" => Some(Self::Dashboard),
            "survey" => Some(Self::Survey),
            "journey" => Some(Self::Journey),
            _ => None,
        }
    }
}

/// A resolved view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum Route {
    Login,
    Dashboard,
    Survey,
    Journey { case_id: String },
}

impl Route {
    pub fn path(&self) -> String {
        match self {
            Self::Login => "/".to_string(),
            Self::Dashboard => "/dashboard".to_string(),
            Self::Survey => "/survey".to_string(),
            Self::Journey { case_id } => format!("/journey/{case_id}"),
        }
    }

    /// Resolve a view request. Journey without an id falls back to the
    /// dashboard; everything resolves to login while logged out.
    pub fn resolve(view: View, id: Option<&str>, logged_in: bool) -> Self {
        if !logged_in {
            return Self::Login;
        }
        match view {
            View::Login => Self::Login,
            View::Dashboard => Self::Dashboard,
            View::Survey => Self::Survey,
            View::Journey => match id.map(str::trim).filter(|s| !s.is_empty()) {
                Some(case_id) => Self::Journey {
                    case_id: case_id.to_string(),
                },
                None => Self::Dashboard,
            },
        }
    }

    /// Map a path back to a view request.
    pub fn parse(path: &str) -> Option<(View, Option<String>)> {
        let trimmed = path.trim().trim_end_matches('/');
        let mut parts = trimmed.split('/').skip(1);
        match (parts.next(), parts.next(), parts.next()) {
            (None, _, _) | (Some(""), None, _) => Some((View::Login, None)),
            (Some("dashboard"), None, _) => Some((View::Dashboard, None)),
            (Some("survey"), None, _) => Some((View::Survey, None)),
            (Some("journey"), id, None) => Some((View::Journey, id.map(str::to_string))),
            _ => None,
        }
    }
}

/// Current route plus a short back-stack.
#[derive(Debug)]
pub struct ViewRouter {
    current: Route,
    history: Vec<Route>,
}

impl Default for ViewRouter {
    fn default() -> Self {
        Self {
            current: Route::Login,
            history: Vec::new(),
        }
    }
}

impl ViewRouter {
    pub fn current(&self) -> &Route {
        &self.current
    }

    pub fn history(&self) -> &[Route] {
        &self.history
    }

    pub fn navigate(&mut self, view: View, id: Option<&str>, logged_in: bool) -> Route {
        let route = Route::resolve(view, id, logged_in);
        if route != self.current {
            let previous = std::mem::replace(&mut self.current, route.clone());
            self.history.push(previous);
            if self.history.len() > HISTORY_LIMIT {
                self.history.remove(0);
            }
        }
        debug!(path = %route.path(), "Navigated");
        route
    }

    /// Go back one step. The previous route is re-resolved, so going back
    /// after logout still lands on login.
    pub fn back(&mut self, logged_in: bool) -> Route {
        let Some(previous) = self.history.pop() else {
            return self.current.clone();
        };
        let route = if logged_in { previous } else { Route::Login };
        self.current = route.clone();
        route
    }

    /// Forget everything (logout).
    pub fn reset(&mut self) {
        self.current = Route::Login;
        self.history.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn logged_out_always_resolves_to_login() {
        for view in [View::Dashboard, View::Survey, View::Journey] {
            assert_eq!(Route::resolve(view, Some("CS0001"), false), Route::Login);
        }
    }

    #[test]
    fn journey_without_id_is_dashboard() {
        assert_eq!(Route::resolve(View::Journey, None, true), Route::Dashboard);
        assert_eq!(Route::resolve(View::Journey, Some("  "), true), Route::Dashboard);
        assert_eq!(
            Route::resolve(View::Journey, Some("CS0002"), true),
            Route::Journey {
                case_id: "CS0002".into()
            }
        );
    }

    #[test]
    fn parse_paths() {
        assert_eq!(Route::parse("/"), Some((View::Login, None)));
        assert_eq!(Route::parse("/dashboard"), Some((View::Dashboard, None)));
        assert_eq!(Route::parse("/survey/"), Some((View::Survey, None)));
        assert_eq!(
            Route::parse("/journey/CS0003"),
            Some((View::Journey, Some("CS0003".into())))
        );
        assert_eq!(Route::parse("/journey"), Some((View::Journey, None)));
        assert_eq!(Route::parse("/admin"), None);
        assert_eq!(Route::parse("/journey/a/b"), None);
    }

    #[test]
    fn path_roundtrip() {
        let route = Route::Journey {
            case_id: "CS0001".into(),
        };
        let (view, id) = Route::parse(&route.path()).unwrap();
        assert_eq!(Route::resolve(view, id.as_deref(), true), route);
    }

    #[test]
    fn history_and_back() {
        let mut router = ViewRouter::default();
        router.navigate(View::Dashboard, None, true);
        router.navigate(View::Journey, Some("CS0002"), true);
        assert_eq!(router.history().len(), 2);

        assert_eq!(router.back(true), Route::Dashboard);
        assert_eq!(router.current(), &Route::Dashboard);
    }

    #[test]
    fn history_is_bounded() {
        let mut router = ViewRouter::default();
        for i in 0..50 {
            router.navigate(View::Journey, Some(&format!("CS{i:04}")), true);
        }
        assert_eq!(router.history().len(), HISTORY_LIMIT);
    }

    #[test]
    fn back_when_logged_out_is_login() {
        let mut router = ViewRouter::default();
        router.navigate(View::Dashboard, None, true);
        router.navigate(View::Survey, None, true);
        assert_eq!(router.back(false), Route::Login);
    }
}
