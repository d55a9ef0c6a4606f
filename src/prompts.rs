use chrono::NaiveDate;
use serde_json::{json, Value};

use crate::model::{AnalysisReport, DrivingForce};

pub const SYSTEM_INSTRUCTION: &str = "你是一位奉行查理·蒙格「格柵思維」(latticework of mental models) 的全球趨勢戰略分析師。

任務：針對使用者輸入的趨勢信號，以即時網路搜尋取得最新資料，並透過以下五大驅動力逐一拆解：
1. 能源與物理約束：電力、原物料、熱力學與基礎設施的硬限制。
2. 勞動力與自動化：人口結構、技能缺口、機器人與自動化替代。
3. 地緣政治離婚：供應鏈脫鉤、關稅、出口管制與陣營化。
4. 數位化實體資產：實體資產的代幣化、數位孿生與資料化。
5. 智能代理化：AI 代理取代流程、決策與交易的程度。

要求：
- 每一項驅動力都必須提供描述、深度分析、實證數據（附具體數字與時間）與未來演進路徑。
- 進行逆向思考：說明什麼證據會推翻此趨勢（證偽協議），以及不可逾越的物理極限。
- 提出台股與美股的具體標的，說明投資邏輯、主要風險、1-5 的風險等級，並對應最相關的驅動力。
- 以 1-10 分誠實評估所引用資料的新鮮度，並說明理由與資料最後更新時間。
- 全部內容使用繁體中文，語氣冷靜、理性、具體，不做空泛預測。
- 僅輸出符合指定結構的 JSON，不得附加任何說明文字。";

pub const PRESET_QUERIES: [&str; 4] = [
    "AI 晶片供應鏈在電力短缺下的重新佈局",
    "人形機器人量產對製造業勞動力的衝擊",
    "美中科技脫鉤下的半導體設備出口管制",
    "實體資產代幣化 (RWA) 與鏈上國債的興起",
];

pub const ARTICLE_FALLBACK_TITLE: &str = "趨勢分析";

/// First user turn of an analysis request.
pub fn analysis_contents(query: &str, today: NaiveDate) -> String {
    format!(
        "[目前的真實日期: {}] \n\n 使用者輸入信號: {}",
        today.format("%Y/%-m/%-d"),
        query
    )
}

fn string_field() -> Value {
    json!({ "type": "STRING" })
}

fn force_detail_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "description": string_field(),
            "detailedAnalysis": string_field(),
            "empiricalData": string_field(),
            "futurePath": string_field()
        },
        "required": ["description", "detailedAnalysis", "empiricalData", "futurePath"]
    })
}

fn stock_list_schema() -> Value {
    let labels: Vec<&str> = DrivingForce::ALL.iter().map(|f| f.label()).collect();
    json!({
        "type": "ARRAY",
        "items": {
            "type": "OBJECT",
            "properties": {
                "ticker": string_field(),
                "name": string_field(),
                "logic": string_field(),
                "risk": string_field(),
                "riskLevel": { "type": "INTEGER" },
                "correlatedForce": { "type": "STRING", "enum": labels }
            },
            "required": ["ticker", "name", "logic", "risk", "riskLevel", "correlatedForce"]
        }
    })
}

/// Structured-output contract for the analysis call.
pub fn report_schema() -> Value {
    let mut force_props = serde_json::Map::new();
    for force in DrivingForce::ALL {
        force_props.insert(force.label().to_string(), force_detail_schema());
    }
    let labels: Vec<&str> = DrivingForce::ALL.iter().map(|f| f.label()).collect();

    json!({
        "type": "OBJECT",
        "properties": {
            "title": string_field(),
            "summary": string_field(),
            "forces": {
                "type": "OBJECT",
                "properties": force_props,
                "required": labels
            },
            "inversion": {
                "type": "OBJECT",
                "properties": {
                    "falsification": string_field(),
                    "physicalLimits": string_field()
                },
                "required": ["falsification", "physicalLimits"]
            },
            "investments": {
                "type": "OBJECT",
                "properties": {
                    "taiwanStocks": stock_list_schema(),
                    "usStocks": stock_list_schema(),
                    "strategicSummary": string_field()
                },
                "required": ["taiwanStocks", "usStocks", "strategicSummary"]
            },
            "dataFreshness": {
                "type": "OBJECT",
                "properties": {
                    "score": { "type": "INTEGER" },
                    "reason": string_field(),
                    "lastUpdatedInfo": string_field()
                },
                "required": ["score", "reason", "lastUpdatedInfo"]
            }
        },
        "required": ["title", "summary", "forces", "inversion", "investments", "dataFreshness"]
    })
}

pub fn article_prompt(report: &AnalysisReport, min_chars: usize) -> String {
    let forces = DrivingForce::ALL
        .iter()
        .map(|f| f.label())
        .collect::<Vec<_>>()
        .join("、");

    format!(
        "請根據以下「全球趨勢雷達分析數據」撰寫一篇深度專題文章。

分析主題：{title}

文章架構要求：
1. 標題：起一個具有震懾力、大師感的專欄標題。
2. 導讀：用一個具體的場景或生活例子切入，帶出目前全球正在發生的巨變。
3. 格柵拆解：將五大驅動力融合進敘事，不要死板條列。用「故事＋邏輯」的方式解釋為什麼 {forces} 正在交織。
4. 投資者的指南針：根據數據中的投資佈局，詳細解釋其背後的戰略價值。
5. 證偽思考：引用證偽協議與物理極限，展現格柵思維的理性與不盲從。
6. 結論：給讀者一段具備行動啟發性的總結。

排版規則：
- 文章標題使用「# 」開頭，各段小標使用「## 」開頭。
- 引用與金句使用「> 」開頭。
- 條列重點使用「- 」開頭。
- 不要使用表格。

寫作風格：生動、白話但具備專業深度（查理·蒙格風格）。必須超過 {min_chars} 字繁體中文。

詳細數據參考：
摘要：{summary}
投資戰略：{strategy}
證偽觀點：{falsification}
物理極限：{limits}
",
        title = report.title,
        forces = forces,
        min_chars = min_chars,
        summary = report.summary,
        strategy = report.investments.strategic_summary,
        falsification = report.inversion.falsification,
        limits = report.inversion.physical_limits,
    )
}
