//! robots.txt rule model and evaluation.
//!
//! Parsing is line-oriented and fails softly: comments, unrecognized
//! directives, and malformed lines are skipped, never an error.
//!
//! Evaluation is deliberately the "classic" semantics: within the selected
//! group the first rule whose pattern matches the path decides the outcome,
//! in declaration order. This diverges from the longest-match-wins rule used
//! by some major crawlers and is part of this crate's documented contract;
//! do not change it silently.

use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Directive {
    Allow,
    Disallow,
}

#[derive(Debug, Clone)]
struct Rule {
    directive: Directive,
    pattern: String,
}

/// One or more user-agent tokens paired with an ordered rule list.
#[derive(Debug, Clone, Default)]
struct Group {
    /// Lowercased agent tokens this group applies to.
    agents: Vec<String>,
    /// Rules in declaration order.
    rules: Vec<Rule>,
    crawl_delay: Option<f64>,
    request_rate: Option<RequestRate>,
}

/// A `Request-rate: m/n` advisory: `requests` per `seconds`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestRate {
    pub requests: u32,
    pub seconds: u32,
}

/// Parsed representation of one site's crawl policy.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    groups: Vec<Group>,
    sitemaps: Vec<String>,
    disallow_all: bool,
    allow_all: bool,
}

impl RuleSet {
    /// A policy that denies every path for every agent. Used when the policy
    /// document answered 401/403, and for the conservative failure default.
    pub fn deny_all() -> Self {
        Self { disallow_all: true, ..Default::default() }
    }

    /// A policy that permits every path for every agent. Used when the site
    /// asserts no policy (generic 4xx).
    pub fn permit_all() -> Self {
        Self { allow_all: true, ..Default::default() }
    }

    /// Parse raw robots.txt text into a rule set.
    ///
    /// Consecutive `User-agent:` lines share the directives that follow,
    /// until the next `User-agent:` block begins.
    pub fn parse(raw: &str) -> Self {
        let mut set = RuleSet::default();
        // True while the previous meaningful line was a User-agent line, so
        // stacked agent declarations join one group.
        let mut collecting_agents = false;

        for line in raw.lines() {
            let line = match line.find('#') {
                Some(i) => &line[..i],
                None => line,
            };
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            let key = key.trim().to_ascii_lowercase();
            let value = value.trim();

            match key.as_str() {
                "user-agent" => {
                    if value.is_empty() {
                        continue;
                    }
                    if !collecting_agents {
                        set.groups.push(Group::default());
                        collecting_agents = true;
                    }
                    if let Some(group) = set.groups.last_mut() {
                        group.agents.push(value.to_ascii_lowercase());
                    }
                }
                "allow" | "disallow" => {
                    collecting_agents = false;
                    if value.is_empty() {
                        continue;
                    }
                    let directive = if key == "allow" { Directive::Allow } else { Directive::Disallow };
                    if let Some(group) = set.groups.last_mut() {
                        group.rules.push(Rule { directive, pattern: value.to_string() });
                    }
                }
                "sitemap" => {
                    collecting_agents = false;
                    if !value.is_empty() {
                        set.sitemaps.push(value.to_string());
                    }
                }
                "crawl-delay" => {
                    collecting_agents = false;
                    if let (Some(group), Ok(delay)) = (set.groups.last_mut(), value.parse::<f64>()) {
                        group.crawl_delay = Some(delay);
                    }
                }
                "request-rate" => {
                    collecting_agents = false;
                    if let (Some(group), Some(rate)) = (set.groups.last_mut(), parse_request_rate(value)) {
                        group.request_rate = Some(rate);
                    }
                }
                _ => {
                    collecting_agents = false;
                }
            }
        }

        set
    }

    /// Whether `user_agent` may fetch `url` (a full URL or a bare path).
    ///
    /// Selects the best-matching group (exact token beats `*`; neither
    /// matching means allow), then applies first-match-wins over its rules.
    pub fn can_fetch(&self, user_agent: &str, url: &str) -> bool {
        if self.disallow_all {
            return false;
        }
        if self.allow_all {
            return true;
        }

        let path = request_path(url);
        let Some(group) = self.best_group(user_agent) else {
            return true;
        };

        for rule in &group.rules {
            if pattern_matches(&rule.pattern, &path) {
                return rule.directive == Directive::Allow;
            }
        }

        true
    }

    /// Sitemap URLs in declaration order; empty if none declared.
    pub fn sitemaps(&self) -> &[String] {
        &self.sitemaps
    }

    /// Crawl-delay advisory for the best-matching group, in seconds.
    pub fn crawl_delay(&self, user_agent: &str) -> Option<f64> {
        self.best_group(user_agent).and_then(|g| g.crawl_delay)
    }

    /// Request-rate advisory for the best-matching group.
    pub fn request_rate(&self, user_agent: &str) -> Option<RequestRate> {
        self.best_group(user_agent).and_then(|g| g.request_rate)
    }

    fn best_group(&self, user_agent: &str) -> Option<&Group> {
        // The product token before any "/" is what robots.txt names.
        let token = user_agent
            .split('/')
            .next()
            .unwrap_or(user_agent)
            .trim()
            .to_ascii_lowercase();

        self.groups
            .iter()
            .find(|g| g.agents.iter().any(|a| *a == token))
            .or_else(|| self.groups.iter().find(|g| g.agents.iter().any(|a| a == "*")))
    }
}

fn parse_request_rate(value: &str) -> Option<RequestRate> {
    let (requests, seconds) = value.split_once('/')?;
    let requests = requests.trim().parse().ok()?;
    let seconds = seconds.trim().parse().ok()?;
    Some(RequestRate { requests, seconds })
}

/// Reduce a full URL to the path robots rules are matched against.
/// Bare paths pass through; anything unparseable is treated as "/".
fn request_path(url: &str) -> String {
    if url.contains("://") {
        match Url::parse(url) {
            Ok(parsed) => parsed.path().to_string(),
            Err(_) => "/".to_string(),
        }
    } else if url.starts_with('/') {
        url.to_string()
    } else if url.is_empty() {
        "/".to_string()
    } else {
        format!("/{}", url)
    }
}

/// Prefix match with `*` wildcard and `$` end anchor.
fn pattern_matches(pattern: &str, path: &str) -> bool {
    let (body, anchored) = match pattern.strip_suffix('$') {
        Some(p) => (p, true),
        None => (pattern, false),
    };

    let parts: Vec<&str> = body.split('*').collect();

    if parts.len() == 1 {
        return if anchored { path == body } else { path.starts_with(body) };
    }

    if !path.starts_with(parts[0]) {
        return false;
    }
    let mut pos = parts[0].len();

    for (i, part) in parts.iter().enumerate().skip(1) {
        let is_last = i == parts.len() - 1;
        if is_last && anchored {
            return path[pos..].ends_with(part);
        }
        if part.is_empty() {
            continue;
        }
        match path[pos..].find(part) {
            Some(found) => pos += found + part.len(),
            None => return false,
        }
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_match_wins_disallow_first() {
        let rules = RuleSet::parse("User-agent: *\nDisallow: /a\nAllow: /a/b");
        assert!(!rules.can_fetch("*", "/a/b"));
    }

    #[test]
    fn test_first_match_wins_allow_first() {
        let rules = RuleSet::parse("User-agent: *\nAllow: /a/b\nDisallow: /a");
        assert!(rules.can_fetch("*", "/a/b"));
        assert!(!rules.can_fetch("*", "/a/c"));
    }

    #[test]
    fn test_no_matching_rule_allows() {
        let rules = RuleSet::parse("User-agent: *\nDisallow: /private");
        assert!(rules.can_fetch("*", "/public"));
    }

    #[test]
    fn test_full_url_reduced_to_path() {
        let rules = RuleSet::parse("User-agent: *\nDisallow: /private");
        assert!(!rules.can_fetch("cuppy/0.1", "https://example.com/private/page"));
        assert!(rules.can_fetch("cuppy/0.1", "https://example.com/open"));
    }

    #[test]
    fn test_exact_agent_beats_wildcard() {
        let text = "User-agent: cuppy\nDisallow: /only-for-cuppy\n\nUser-agent: *\nDisallow: /";
        let rules = RuleSet::parse(text);
        assert!(!rules.can_fetch("cuppy", "/only-for-cuppy"));
        assert!(rules.can_fetch("cuppy/0.1", "/anything-else"));
        assert!(!rules.can_fetch("otherbot", "/anything-else"));
    }

    #[test]
    fn test_agent_match_is_case_insensitive() {
        let rules = RuleSet::parse("User-agent: CuPPy\nDisallow: /x");
        assert!(!rules.can_fetch("cuppy", "/x"));
    }

    #[test]
    fn test_no_group_matches_allows_all() {
        let rules = RuleSet::parse("User-agent: googlebot\nDisallow: /");
        assert!(rules.can_fetch("cuppy", "/anything"));
    }

    #[test]
    fn test_stacked_user_agents_share_rules() {
        let text = "User-agent: a\nUser-agent: b\nDisallow: /shared";
        let rules = RuleSet::parse(text);
        assert!(!rules.can_fetch("a", "/shared"));
        assert!(!rules.can_fetch("b", "/shared"));
    }

    #[test]
    fn test_user_agent_after_rules_starts_new_group() {
        let text = "User-agent: a\nDisallow: /a\nUser-agent: b\nDisallow: /b";
        let rules = RuleSet::parse(text);
        assert!(!rules.can_fetch("a", "/a"));
        assert!(rules.can_fetch("a", "/b"));
        assert!(!rules.can_fetch("b", "/b"));
        assert!(rules.can_fetch("b", "/a"));
    }

    #[test]
    fn test_wildcard_pattern() {
        let rules = RuleSet::parse("User-agent: *\nDisallow: /private*/data");
        assert!(!rules.can_fetch("*", "/private123/data"));
        assert!(!rules.can_fetch("*", "/private/data/deep"));
        assert!(rules.can_fetch("*", "/private123/other"));
    }

    #[test]
    fn test_end_anchor_pattern() {
        let rules = RuleSet::parse("User-agent: *\nDisallow: /*.pdf$");
        assert!(!rules.can_fetch("*", "/docs/report.pdf"));
        assert!(rules.can_fetch("*", "/docs/report.pdf.html"));
    }

    #[test]
    fn test_end_anchor_without_wildcard_is_exact() {
        let rules = RuleSet::parse("User-agent: *\nDisallow: /exact$");
        assert!(!rules.can_fetch("*", "/exact"));
        assert!(rules.can_fetch("*", "/exact/sub"));
    }

    #[test]
    fn test_comments_and_malformed_lines_skipped() {
        let text = "# a comment\nUser-agent: * # trailing comment\nDisallow: /secret\nnot a directive\nBogus: whatever\n";
        let rules = RuleSet::parse(text);
        assert!(!rules.can_fetch("*", "/secret"));
        assert!(rules.can_fetch("*", "/open"));
    }

    #[test]
    fn test_empty_text_allows_all() {
        let rules = RuleSet::parse("");
        assert!(rules.can_fetch("*", "/anything"));
    }

    #[test]
    fn test_sitemaps_in_declaration_order() {
        let text = "Sitemap: https://example.com/a.xml\nUser-agent: *\nDisallow: /x\nSitemap: https://example.com/b.xml";
        let rules = RuleSet::parse(text);
        assert_eq!(rules.sitemaps(), &["https://example.com/a.xml", "https://example.com/b.xml"]);
    }

    #[test]
    fn test_no_sitemaps_is_empty() {
        let rules = RuleSet::parse("User-agent: *\nDisallow: /");
        assert!(rules.sitemaps().is_empty());
    }

    #[test]
    fn test_crawl_delay() {
        let text = "User-agent: cuppy\nCrawl-delay: 2.5\n\nUser-agent: *\nCrawl-delay: 10";
        let rules = RuleSet::parse(text);
        assert_eq!(rules.crawl_delay("cuppy"), Some(2.5));
        assert_eq!(rules.crawl_delay("otherbot"), Some(10.0));
    }

    #[test]
    fn test_crawl_delay_absent() {
        let rules = RuleSet::parse("User-agent: *\nDisallow: /");
        assert_eq!(rules.crawl_delay("*"), None);
    }

    #[test]
    fn test_request_rate() {
        let rules = RuleSet::parse("User-agent: *\nRequest-rate: 3/15");
        assert_eq!(rules.request_rate("*"), Some(RequestRate { requests: 3, seconds: 15 }));
    }

    #[test]
    fn test_request_rate_malformed_skipped() {
        let rules = RuleSet::parse("User-agent: *\nRequest-rate: fast");
        assert_eq!(rules.request_rate("*"), None);
    }

    #[test]
    fn test_deny_all_and_permit_all() {
        assert!(!RuleSet::deny_all().can_fetch("anyone", "/any/path"));
        assert!(RuleSet::permit_all().can_fetch("anyone", "/any/path"));
    }
}
