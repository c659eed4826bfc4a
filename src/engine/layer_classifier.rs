// ==========================================
// NPI 主流程排程系统 - 站点层别分类器
// ==========================================
// 职责: 站点短/长描述 → 粗粒度层别标签
// 红线: 尽力而为,永不报错; 词表来自配置,不在此硬编码
// ==========================================
// 规则（顺序执行，命中即返回）:
// 1) 长描述含 "START" → START
// 2) 长描述含 "PACK"  → SHIP
// 3) 短描述按词表顺序逐个剔除后取前 3 字符
// 4) 候选不在长描述中 → 'M' 开头改为 MT+次字符, 否则 VA+次字符
// ==========================================

use crate::config::FlowTaxonomy;

pub const START_LAYER: &str = "START";
pub const SHIP_LAYER: &str = "SHIP";

// ==========================================
// OperationLayerClassifier
// ==========================================
#[derive(Debug, Clone)]
pub struct OperationLayerClassifier {
    strip_tokens: Vec<String>,
}

impl OperationLayerClassifier {
    /// # 参数
    /// - strip_tokens: 有序剥离词表（长后缀需排在其前缀之前）
    pub fn new(strip_tokens: Vec<String>) -> Self {
        Self { strip_tokens }
    }

    pub fn from_taxonomy(taxonomy: &FlowTaxonomy) -> Self {
        Self::new(taxonomy.strip_tokens.clone())
    }

    /// 分类
    pub fn classify(&self, short_desc: &str, long_desc: &str) -> String {
        if long_desc.contains(START_LAYER) {
            return START_LAYER.to_string();
        }
        if long_desc.contains("PACK") {
            return SHIP_LAYER.to_string();
        }

        let candidate = self.candidate_tag(short_desc);
        if long_desc.contains(candidate.as_str()) {
            return candidate;
        }

        // 候选不可靠: 按首字符回退（次字符缺失时直接省略）
        let mut chars = candidate.chars();
        let first = chars.next();
        let second: String = chars.next().map(String::from).unwrap_or_default();
        match first {
            Some('M') => format!("MT{}", second),
            _ => format!("VA{}", second),
        }
    }

    /// 剥离词表后的前 3 个字符
    fn candidate_tag(&self, short_desc: &str) -> String {
        let stripped = self
            .strip_tokens
            .iter()
            .filter(|t| !t.is_empty())
            .fold(short_desc.to_string(), |acc, token| acc.replace(token.as_str(), ""));

        stripped.chars().take(3).collect()
    }
}

impl Default for OperationLayerClassifier {
    fn default() -> Self {
        Self::from_taxonomy(&FlowTaxonomy::default())
    }
}
