// ==========================================
// NPI 主流程排程系统 - 主流程模型
// ==========================================
// 红线: order_index 必须稠密、从 0 开始、无重复
// 用途: FlowBuilder 写入,初始化后只读共享
// ==========================================

use serde::{Deserialize, Serialize};

// ==========================================
// CanonicalFlowEntry - 主流程条目
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalFlowEntry {
    pub order_index: usize,
    pub operation_code: i64,
    pub operation_short_desc: String,
    pub operation_long_desc: String,
    pub layer: String,
}

// ==========================================
// CanonicalFlow - 主流程
// ==========================================
// 反序列化经 TryFrom 校验 order_index 稠密
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<CanonicalFlowEntry>", into = "Vec<CanonicalFlowEntry>")]
pub struct CanonicalFlow {
    entries: Vec<CanonicalFlowEntry>,
}

impl CanonicalFlow {
    /// 由已编号条目构造
    ///
    /// 调用方负责保证 order_index 连续（FlowBuilder 内部保证）
    pub(crate) fn from_entries(entries: Vec<CanonicalFlowEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[CanonicalFlowEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 按短描述查找所有匹配条目（短描述在主流程中可能重复出现）
    pub fn entries_for_short_desc<'a>(
        &'a self,
        short_desc: &'a str,
    ) -> impl Iterator<Item = &'a CanonicalFlowEntry> + 'a {
        self.entries
            .iter()
            .filter(move |e| e.operation_short_desc == short_desc)
    }

    /// 主流程中出现过的层别（按首次出现顺序去重）
    pub fn layers(&self) -> Vec<&str> {
        let mut layers: Vec<&str> = Vec::new();
        for entry in &self.entries {
            if !layers.contains(&entry.layer.as_str()) {
                layers.push(entry.layer.as_str());
            }
        }
        layers
    }
}

impl TryFrom<Vec<CanonicalFlowEntry>> for CanonicalFlow {
    type Error = String;

    fn try_from(entries: Vec<CanonicalFlowEntry>) -> Result<Self, Self::Error> {
        if let Some((idx, entry)) = entries
            .iter()
            .enumerate()
            .find(|(idx, e)| e.order_index != *idx)
        {
            return Err(format!(
                "主流程 order_index 不连续: 位置 {} 的 order_index = {}",
                idx, entry.order_index
            ));
        }
        Ok(Self { entries })
    }
}

impl From<CanonicalFlow> for Vec<CanonicalFlowEntry> {
    fn from(flow: CanonicalFlow) -> Self {
        flow.entries
    }
}
