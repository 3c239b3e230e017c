use std::fmt::Write as _;

use super::domain::{PaybackPeriod, ProjectionResult};

pub const DEFAULT_SIGNATURE: &str = "詳細な相談は民泊塾まで！";
pub const CALCULATION_FAILED: &str = "計算エラーが発生しました。";

/// Renders projection results and chat guidance as fixed-layout text.
#[derive(Debug, Clone)]
pub struct ResultFormatter {
    site_url: String,
    signature: String,
}

impl ResultFormatter {
    pub fn new(site_url: impl Into<String>, signature: impl Into<String>) -> Self {
        Self {
            site_url: site_url.into(),
            signature: signature.into(),
        }
    }

    pub fn format(&self, result: &ProjectionResult) -> String {
        let mut message = String::new();

        message.push_str("🏠 民泊収益シミュレーション結果\n\n");

        message.push_str("📍 基本情報\n");
        writeln!(message, "地域: {}", result.region).expect("write region");
        writeln!(message, "運営形態: {}", result.operation_type.label())
            .expect("write operation type");
        writeln!(message, "物件: {} {}㎡", result.property_type, result.area)
            .expect("write property");
        writeln!(message, "収容人数: {}名", result.capacity).expect("write capacity");
        writeln!(message, "民泊法: {}", result.minpaku_law).expect("write legal regime");
        message.push('\n');

        message.push_str("💰 収益予測\n");
        writeln!(message, "1泊単価: ¥{}", group_thousands(result.daily_rate))
            .expect("write daily rate");
        writeln!(message, "稼働率: {:.1}%", result.occupancy_rate).expect("write occupancy");
        writeln!(message, "年間稼働日数: {}日", result.actual_operating_days)
            .expect("write operating days");
        message.push('\n');

        writeln!(message, "年間売上: ¥{}", group_thousands(result.annual_revenue))
            .expect("write revenue");
        writeln!(message, "年間費用: ¥{}", group_thousands(result.annual_costs))
            .expect("write costs");
        writeln!(message, "年間利益: ¥{}", group_thousands(result.annual_profit))
            .expect("write profit");
        writeln!(
            message,
            "月間売上: ¥{}",
            group_rounded(result.monthly_revenue.value())
        )
        .expect("write monthly revenue");
        writeln!(
            message,
            "月間利益: ¥{}",
            group_rounded(result.monthly_profit.value())
        )
        .expect("write monthly profit");
        message.push('\n');

        message.push_str("📊 投資指標\n");
        writeln!(
            message,
            "総投資額: ¥{}",
            group_thousands(result.total_investment)
        )
        .expect("write investment");
        writeln!(message, "ROI: {:.1}%", result.roi).expect("write roi");
        writeln!(message, "投資回収期間: {}", payback_label(result.payback_period))
            .expect("write payback");
        message.push('\n');

        message.push_str(
            "💡 この結果は概算です。実際の運営では清掃費、光熱費、管理費等の運営コストも考慮してください。\n\n",
        );
        message.push_str(&self.signature);

        message
    }

    pub fn no_results(&self) -> String {
        format!(
            "まだシミュレーション結果がありません。\n\n\
             以下の手順でシミュレーションを実行してください：\n\
             1. 民泊シミュレーターサイトにアクセス\n\
             2. 必要な情報を入力\n\
             3. 「結果を計算」ボタンをクリック\n\
             4. 再度「結果」とメッセージを送信\n\n\
             サイト: {}",
            self.site_url
        )
    }

    pub fn storage_unavailable(&self) -> String {
        format!(
            "🏠 民泊収益シミュレーター\n\n\
             データベースエラーが発生しました。\n\n\
             🌐 シミュレーションを開始:\n{}",
            self.site_url
        )
    }

    pub fn welcome(&self) -> String {
        format!(
            "🏠 民泊収益シミュレーターへようこそ！\n\n\
             民泊収益シミュレーターの使い方：\n\n\
             1. シミュレーターサイトで物件情報を入力\n\
             2. 「結果を計算」ボタンをクリック\n\
             3. このトークで「結果」と送信\n\
             4. 詳細な収益予測を確認\n\n\
             サイト: {}\n\n\
             何かご質問があれば、お気軽にお声かけください！",
            self.site_url
        )
    }

    pub fn usage_hint(&self) -> String {
        format!(
            "🏠 民泊収益シミュレーター\n\n\
             「結果」と入力すると最新のシミュレーション結果をお送りします。\n\n\
             🌐 新しいシミュレーション:\n{}",
            self.site_url
        )
    }
}

fn payback_label(period: PaybackPeriod) -> String {
    match period {
        PaybackPeriod::Years(years) => format!("{years:.1}年"),
        PaybackPeriod::Never => "回収見込みなし".to_string(),
    }
}

/// `1234567` → `"1,234,567"`.
pub fn group_thousands(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if value < 0 {
        grouped.push('-');
    }
    for (index, digit) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    grouped
}

fn group_rounded(value: f64) -> String {
    group_thousands(value.round() as i64)
}
