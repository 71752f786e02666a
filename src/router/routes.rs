//! Route table: declarative records, path matching and locations.
//!
//! Patterns are `/`-separated. A segment is either literal, a `:name`
//! parameter matching exactly one segment, or a catch-all `:name(.*)*`
//! matching the remainder. Catch-all records are tried only after every other
//! record failed, regardless of declaration order.

use std::collections::BTreeMap;

use url::form_urlencoded;

pub const APP_TITLE: &str = "软件工程课程智能助手";

// =============================================================================
// RECORDS
// =============================================================================

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RouteMeta {
    pub title: Option<String>,
    pub requires_auth: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RouteRecord {
    /// Absolute when it starts with `/`, otherwise relative to the parent.
    pub path: String,
    pub name: String,
    pub meta: RouteMeta,
    pub children: Vec<RouteRecord>,
}

impl RouteRecord {
    #[must_use]
    pub fn new(path: impl Into<String>, name: impl Into<String>) -> Self {
        Self { path: path.into(), name: name.into(), meta: RouteMeta::default(), children: Vec::new() }
    }

    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.meta.title = Some(title.into());
        self
    }

    #[must_use]
    pub fn requires_auth(mut self) -> Self {
        self.meta.requires_auth = true;
        self
    }

    #[must_use]
    pub fn children(mut self, children: Vec<RouteRecord>) -> Self {
        self.children = children;
        self
    }
}

/// One record of a resolved chain, with its absolute pattern.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MatchedRecord {
    pub name: String,
    pub pattern: String,
    pub meta: RouteMeta,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RouteMatch {
    /// Root ancestor first, matched leaf last.
    pub matched: Vec<MatchedRecord>,
    pub params: BTreeMap<String, String>,
}

impl RouteMatch {
    #[must_use]
    pub fn leaf(&self) -> Option<&MatchedRecord> {
        self.matched.last()
    }

    #[must_use]
    pub fn requires_auth(&self) -> bool {
        self.matched.iter().any(|r| r.meta.requires_auth)
    }

    /// Leaf title, or the application title when the leaf has none.
    #[must_use]
    pub fn title(&self) -> String {
        self.leaf()
            .and_then(|r| r.meta.title.clone())
            .unwrap_or_else(|| APP_TITLE.to_owned())
    }
}

// =============================================================================
// MATCHING
// =============================================================================

#[derive(Clone, Debug, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
    CatchAll(String),
}

impl Segment {
    fn parse(raw: &str) -> Self {
        match raw.strip_prefix(':') {
            Some(rest) => match rest.split_once('(') {
                Some((name, _)) => Self::CatchAll(name.to_owned()),
                None => Self::Param(rest.to_owned()),
            },
            None => Self::Literal(raw.to_owned()),
        }
    }
}

#[derive(Clone, Debug)]
struct CompiledRoute {
    segments: Vec<Segment>,
    chain: Vec<MatchedRecord>,
}

impl CompiledRoute {
    fn is_catch_all(&self) -> bool {
        matches!(self.segments.last(), Some(Segment::CatchAll(_)))
    }

    fn matches(&self, parts: &[&str]) -> Option<BTreeMap<String, String>> {
        let mut params = BTreeMap::new();
        for (i, segment) in self.segments.iter().enumerate() {
            match segment {
                Segment::CatchAll(name) => {
                    params.insert(name.clone(), parts.get(i..).unwrap_or_default().join("/"));
                    return Some(params);
                }
                Segment::Literal(lit) => {
                    if parts.get(i) != Some(&lit.as_str()) {
                        return None;
                    }
                }
                Segment::Param(name) => {
                    params.insert(name.clone(), (*parts.get(i)?).to_owned());
                }
            }
        }
        (parts.len() == self.segments.len()).then_some(params)
    }
}

fn split_path(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

fn join_pattern(parent: &str, child: &str) -> String {
    if child.starts_with('/') {
        return child.to_owned();
    }
    let parent = parent.trim_end_matches('/');
    if child.is_empty() { parent.to_owned() } else { format!("{parent}/{child}") }
}

#[derive(Clone, Debug)]
pub struct RouteTable {
    routes: Vec<CompiledRoute>,
}

impl RouteTable {
    #[must_use]
    pub fn new(records: &[RouteRecord]) -> Self {
        let mut routes = Vec::new();
        for record in records {
            compile(record, "/", &[], &mut routes);
        }
        // Stable: declaration order is kept within each group.
        routes.sort_by_key(CompiledRoute::is_catch_all);
        Self { routes }
    }

    /// Resolve a path (without query) to its record chain.
    #[must_use]
    pub fn resolve(&self, path: &str) -> Option<RouteMatch> {
        let parts = split_path(path);
        self.routes.iter().find_map(|route| {
            route.matches(&parts).map(|params| RouteMatch { matched: route.chain.clone(), params })
        })
    }

    /// Absolute patterns in match order.
    pub fn patterns(&self) -> impl Iterator<Item = (&str, &MatchedRecord)> {
        self.routes
            .iter()
            .filter_map(|r| r.chain.last().map(|leaf| (leaf.pattern.as_str(), leaf)))
    }
}

fn compile(record: &RouteRecord, parent: &str, ancestors: &[MatchedRecord], out: &mut Vec<CompiledRoute>) {
    let pattern = join_pattern(parent, &record.path);
    let mut chain = ancestors.to_vec();
    chain.push(MatchedRecord { name: record.name.clone(), pattern: pattern.clone(), meta: record.meta.clone() });

    out.push(CompiledRoute { segments: split_path(&pattern).into_iter().map(Segment::parse).collect(), chain: chain.clone() });
    for child in &record.children {
        compile(child, &pattern, &chain, out);
    }
}

// =============================================================================
// LOCATION
// =============================================================================

/// A navigation target: path plus decoded query.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Location {
    pub path: String,
    pub query: BTreeMap<String, String>,
}

impl Location {
    /// Parse `path?query#fragment`. The fragment is dropped; an empty path
    /// becomes `/`.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let raw = raw.split_once('#').map_or(raw, |(before, _)| before);
        let (path, query) = raw.split_once('?').unwrap_or((raw, ""));
        let path = if path.is_empty() { "/".to_owned() } else { path.to_owned() };
        let query = form_urlencoded::parse(query.as_bytes()).into_owned().collect();
        Self { path, query }
    }

    #[must_use]
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }

    /// Path plus encoded query, as it would appear in the address bar.
    #[must_use]
    pub fn full_path(&self) -> String {
        if self.query.is_empty() {
            return self.path.clone();
        }
        let query = form_urlencoded::Serializer::new(String::new()).extend_pairs(&self.query).finish();
        format!("{}?{query}", self.path)
    }

    /// Where to go after a successful login.
    #[must_use]
    pub fn redirect_target(&self) -> &str {
        self.query.get("redirect").map_or("/", String::as_str)
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.full_path())
    }
}

// =============================================================================
// APPLICATION ROUTES
// =============================================================================

fn titled(page: &str) -> String {
    format!("{page} - {APP_TITLE}")
}

fn page(path: &str, name: &str, title: &str) -> RouteRecord {
    RouteRecord::new(path, name).title(titled(title))
}

fn private(path: &str, name: &str, title: &str) -> RouteRecord {
    page(path, name, title).requires_auth()
}

/// The application's pages. Everything except home, sign-in, registration
/// and the not-found page needs a session.
#[must_use]
pub fn default_routes() -> Vec<RouteRecord> {
    vec![
        page("/", "Home", "首页"),
        page("/login", "Login", "登录"),
        page("/register", "Register", "注册"),
        private("/dashboard", "Dashboard", "控制台"),
        private("/profile", "Profile", "个人资料"),
        private("/conversations", "Conversations", "历史会话"),
        private("/uml", "UmlIndex", "UML图生成"),
        private("/question", "QuestionIndex", "习题解答"),
        private("/question/practice", "QuestionPractice", "练习题生成"),
        private("/question/explain", "QuestionExplain", "习题解析"),
        private("/explain", "ExplainIndex", "知识解析"),
        private("/paper", "PaperIndex", "论文工具"),
        private("/paper/search", "PaperSearch", "论文搜索"),
        private("/paper/analyze", "PaperAnalyze", "论文应用价值分析"),
        private("/paper/learning-path", "PaperLearningPath", "学习路径推荐"),
        private("/test", "TestIndex", "测试工具"),
        private("/test/generator", "TestGenerator", "测试用例生成"),
        private("/test/analysis", "TestAnalysis", "代码可测性分析"),
        private("/test/coverage", "TestCoverage", "测试覆盖率评估"),
        private("/knowledge", "KnowledgeIndex", "知识库管理"),
        private("/knowledge/builder", "KnowledgeBuilder", "构建知识库"),
        private("/knowledge/notes", "NotesBuilder", "学习笔记"),
        private("/knowledge/mistakes", "MistakesBuilder", "错题集"),
        private("/knowledge/plan", "ReviewPlan", "复习计划"),
        page("/:pathMatch(.*)*", "NotFound", "页面未找到"),
    ]
}

#[cfg(test)]
#[path = "routes_test.rs"]
mod tests;
