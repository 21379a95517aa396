use serde::{Deserialize, Serialize};

/// 科目枚举
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Subject {
    /// 数学
    Mathematics,
    /// 英语
    English,
    /// 希伯来语
    Hebrew,
}

impl Subject {
    /// 获取标准名称（与存储/接口中的取值一致）
    pub fn name(self) -> &'static str {
        match self {
            Subject::Mathematics => "mathematics",
            Subject::English => "english",
            Subject::Hebrew => "hebrew",
        }
    }

    /// 用于标题展示的名称
    pub fn title(self) -> &'static str {
        match self {
            Subject::Mathematics => "Mathematics",
            Subject::English => "English",
            Subject::Hebrew => "Hebrew",
        }
    }

    /// 尝试从字符串解析科目（精确匹配，忽略大小写）
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "mathematics" | "math" | "maths" => Some(Subject::Mathematics),
            "english" => Some(Subject::English),
            "hebrew" | "עברית" => Some(Subject::Hebrew),
            _ => None,
        }
    }

    /// 智能查找科目（支持模糊匹配，例如文件名 `math_hw_03`）
    pub fn find(s: &str) -> Option<Self> {
        // 先尝试精确匹配
        if let Some(subject) = Self::parse(s) {
            return Some(subject);
        }

        // 模糊匹配
        let s_lower = s.to_lowercase();
        if s_lower.contains("math") {
            return Some(Subject::Mathematics);
        }
        if s_lower.contains("english") || s_lower.contains("eng") {
            return Some(Subject::English);
        }
        if s_lower.contains("hebrew") || s_lower.contains("heb") {
            return Some(Subject::Hebrew);
        }

        None
    }
}

impl std::fmt::Display for Subject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!(Subject::parse("Mathematics"), Some(Subject::Mathematics));
        assert_eq!(Subject::parse(" english "), Some(Subject::English));
        assert_eq!(Subject::parse("physics"), None);
    }

    #[test]
    fn find_matches_file_stems() {
        assert_eq!(Subject::find("math_hw_03"), Some(Subject::Mathematics));
        assert_eq!(Subject::find("Hebrew-reading"), Some(Subject::Hebrew));
        assert_eq!(Subject::find("scan_0001"), None);
    }

    #[test]
    fn serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Subject::Hebrew).unwrap(), "\"hebrew\"");
    }
}
