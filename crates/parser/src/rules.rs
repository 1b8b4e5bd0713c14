//! Chapter heading conventions.
//!
//! Each convention is an independent rule so it can be tested on its own. All
//! patterns are anchored at the start of an already trimmed line.

use once_cell::sync::Lazy;
use regex::Regex;

/// CJK and Arabic numerals accepted inside ordinal headings.
const NUMERALS: &str = r"[零一二三四五六七八九十百千万\d]+";

/// A named pattern recognising one heading convention.
#[derive(Debug, Clone)]
pub struct BoundaryRule {
    name: &'static str,
    pattern: Regex,
}

impl BoundaryRule {
    pub fn new(name: &'static str, pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            name,
            pattern: Regex::new(pattern)?,
        })
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn matches(&self, line: &str) -> bool {
        self.pattern.is_match(line)
    }
}

static DEFAULT_RULES: Lazy<Vec<BoundaryRule>> = Lazy::new(|| {
    [
        // 第十二章, 第3回, 第一百节, 第二卷, 第5篇
        ("ordinal-cjk", format!(r"(?i)^第{NUMERALS}[章回节卷篇]")),
        // 卷之三, 上卷之一
        ("volume-cjk", format!(r"(?i)^[上下]?卷之{NUMERALS}")),
        ("chapter-en", r"(?i)^chapter\s+\d+".to_string()),
        // "12. The Storm"
        ("numbered", r"^\d+\.\s+".to_string()),
        ("bracketed", r"^(?:【.*?】|\[.*?\])".to_string()),
    ]
    .into_iter()
    .map(|(name, pattern)| {
        BoundaryRule::new(name, &pattern).expect("built-in heading pattern is valid")
    })
    .collect()
});

/// The built-in rules, in the order they are evaluated.
pub fn default_rules() -> &'static [BoundaryRule] {
    &DEFAULT_RULES
}
