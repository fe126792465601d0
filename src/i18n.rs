// ==========================================
// 工程采购管理系统 - 展示文本
// ==========================================
// 状态/风险/材料分类标签与采购单占位文本, 经由 rust-i18n 取得
// 文本资源: locales/app.yml (繁体中文为默认, 另有英文)
// rust_i18n::i18n! 宏在 lib.rs 中初始化
// ==========================================

/// 默认语言
pub const DEFAULT_LOCALE: &str = "zh-TW";

/// locales/app.yml 提供的语言
pub const SUPPORTED_LOCALES: [&str; 2] = [DEFAULT_LOCALE, "en"];

pub fn current_locale() -> String {
    rust_i18n::locale().to_string()
}

/// 切换展示语言
///
/// # 返回
/// - false: 不支持的语言, 当前语言不变
pub fn set_locale(locale: &str) -> bool {
    if !SUPPORTED_LOCALES.contains(&locale) {
        tracing::warn!(locale, "不支持的语言，保持当前语言");
        return false;
    }
    rust_i18n::set_locale(locale);
    true
}

/// 标签文本
///
/// # 参数
/// - `key`: "<类别>.<代码>", 如 "po_status.confirmed"、"material_category.steel"
pub fn t(key: &str) -> String {
    rust_i18n::t!(key).to_string()
}

// ==========================================
// 采购单占位文本
// ==========================================

/// 询价单中找不到对应项目时, 采购单明细使用的名称
pub fn placeholder_item_name(item_id: &str) -> String {
    rust_i18n::t!("po.placeholder_item_name", id = item_id).to_string()
}

pub fn placeholder_specification() -> String {
    t("po.placeholder_specification")
}

pub fn placeholder_unit() -> String {
    t("po.placeholder_unit")
}

/// 未指定工程阶段的采购单在工程报表中归入的阶段
pub fn default_phase() -> String {
    t("po.default_phase")
}
