// ==========================================
// NPI 主流程排程系统 - 查询文本构建
// ==========================================
// 职责: 领头批发现 / 批次流程历史 / NPI 场景 三类查询
// 约束: 所有字面量经单引号转义后再拼接
// ==========================================

/// 批次选择方式
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LotSelector {
    /// 单个完整批次号（LOT IN）
    Lot(String),
    /// 7 位短批次号集合（LOT7 IN）
    ShortIds(Vec<String>),
}

impl LotSelector {
    /// 日志/错误上下文中使用的描述
    pub fn describe(&self) -> String {
        match self {
            LotSelector::Lot(lot) => lot.clone(),
            LotSelector::ShortIds(ids) => format!("LOT7[{}]", ids.join(",")),
        }
    }
}

/// SQL 字面量转义
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

fn quote_list(values: &[String]) -> String {
    values
        .iter()
        .map(|v| quote_literal(v))
        .collect::<Vec<_>>()
        .join(",")
}

/// 领头批发现查询
///
/// 输出列: LOT7
pub fn lead_lot_query(product: &str, title_pattern: &str) -> String {
    format!(
        r#"
            SELECT DISTINCT
                LOT7
            FROM
                F_LOT
            WHERE
                PRODUCT LIKE {product}
                AND LOT_TITLE LIKE {pattern}
        "#,
        product = quote_literal(product),
        pattern = quote_literal(title_pattern),
    )
}

/// 批次流程历史查询
///
/// 每个 (批次, 站点) 一行: 最小执行序号 + 最大出站时间;
/// 仅保留 8 位完整批次号,站点参考表取最新版本。
///
/// 输出列: LOT, OPERATION, OPER_SHORT, OPER_LONG, AREA, MODULE, SEQ, OUT_DATE
pub fn lot_flow_query(selector: &LotSelector) -> String {
    let filter = match selector {
        LotSelector::Lot(lot) => format!("lf.LOT IN ({})", quote_literal(lot)),
        LotSelector::ShortIds(ids) => format!("lf.LOT7 IN ({})", quote_list(ids)),
    };

    format!(
        r#"
            SELECT DISTINCT
                lf.LOT AS LOT
                ,lf.OPERATION AS OPERATION
                ,lf.OPER_SHORT_DESC AS OPER_SHORT
                ,o.OPER_LONG_DESC AS OPER_LONG
                ,o.AREA AS AREA
                ,o.MODULE AS MODULE
                ,MIN(lf.EXEC_SEQ) AS SEQ
                ,MAX(lf.OUT_DATE) AS OUT_DATE
            FROM
                F_LOT_FLOW lf
                CROSS JOIN F_FACILITY f
                INNER JOIN F_OPERATION o ON o.OPERATION = lf.OPERATION AND o.FACILITY = f.FACILITY AND o.LATEST_VERSION = 'Y'
            WHERE
                {filter}
                AND LENGTH(lf.LOT) = 8
            GROUP BY
                lf.LOT
                ,lf.OPERATION
                ,lf.OPER_SHORT_DESC
                ,o.OPER_LONG_DESC
                ,o.AREA
                ,o.MODULE
        "#,
        filter = filter,
    )
}

/// NPI 场景查询（批次分类源）
///
/// 输出列: DEPT_NAME, GROUP_NAME, DOTPROCESS, SCENARIO_NAME, LOT_TITLE, LOT,
///         OPERATION_DESC, SEG_DAY, HB, COMMIT_OUT, ETA, HAO
pub fn npi_scenario_query() -> String {
    r#"
            SELECT DISTINCT
                RWD.DEPT_NAME AS DEPT_NAME,
                RWG.GROUP_NAME AS GROUP_NAME,
                RWLM.DOTPROCESS AS DOTPROCESS,
                RWLG.SCENARIO_NAME AS SCENARIO_NAME,
                FL.LOT_TITLE AS LOT_TITLE,
                RWLG.LOT AS LOT,
                RWLM.OPERATION || ' ' || RWLM.OPER_SHORT_DESC AS OPERATION_DESC,
                RWLS.SEGMENT_DAY AS SEG_DAY,
                RWSS.HOTBOX AS HB,
                RWLS.COMMITOUT AS COMMIT_OUT,
                RWLS.EXPECTEDOUT AS ETA,
                RWLM.HAO AS HAO
            FROM
                F_RW_DEPT RWD,
                F_RW_GROUP RWG,
                F_RW_LOT_GROUP RWLG,
                F_RW_LOT_MASTER RWLM,
                F_RW_LOT_SCENARIO RWLS,
                F_RW_SCENARIO_SUM RWSS,
                F_LOT FL
            WHERE
                RWD.DEPT_NAME LIKE '%NPI%'
                AND RWD.DEPT_ID = RWG.DEPT_ID
                AND RWLG.GROUP_ID = RWG.GROUP_ID
                AND RWLG.UPDATED_BY NOT LIKE '%ATC%'
                AND RWLG.LOT = RWLM.LOT
                AND RWLG.LOT = RWLS.LOT
                AND RWLG.LOT = RWSS.LOT
                AND RWLG.LOT = FL.LOT
                AND RWLG.SCENARIO_NAME = RWLS.SCENARIO_NAME
                AND RWLG.SCENARIO_NAME = RWSS.SCENARIO_NAME
            ORDER BY
                RWD.DEPT_NAME DESC,
                RWG.GROUP_NAME,
                RWLG.SCENARIO_NAME
        "#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_literal_escapes() {
        assert_eq!(quote_literal("AB'C"), "'AB''C'");
    }

    #[test]
    fn test_lead_lot_query() {
        let sql = lead_lot_query("8PXX%", "NPI% LL%");
        assert!(sql.contains("PRODUCT LIKE '8PXX%'"));
        assert!(sql.contains("LOT_TITLE LIKE 'NPI% LL%'"));
    }

    #[test]
    fn test_lot_flow_query_filters() {
        let single = lot_flow_query(&LotSelector::Lot("D1234567".to_string()));
        assert!(single.contains("lf.LOT IN ('D1234567')"));
        assert!(!single.contains("LOT7 IN"));

        let short = lot_flow_query(&LotSelector::ShortIds(vec!["D123456".into(), "D765432".into()]));
        assert!(short.contains("lf.LOT7 IN ('D123456','D765432')"));
        assert!(short.contains("LENGTH(lf.LOT) = 8"));
    }

    #[test]
    fn test_selector_describe() {
        assert_eq!(LotSelector::Lot("D1234567".into()).describe(), "D1234567");
        assert_eq!(
            LotSelector::ShortIds(vec!["A".into(), "B".into()]).describe(),
            "LOT7[A,B]"
        );
    }
}
