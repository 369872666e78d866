//! Default banned-content patterns.
//!
//! Matched case-insensitively (ASCII folding) as plain substrings. Extra
//! patterns can be added through configuration.

/// Patterns every rule set starts with.
pub const DEFAULT_KEYWORDS: &[&str] = &[
    "qq",
    "www.",
    ".cn",
    ".cc",
    ".com",
    ".top",
    "【",
    "/menu",
    "money/",
    "money\\\\",
    "money\\",
    ".gg",
    "--->",
    "shopgta5",
    "doit#",
    "krutka#",
    "<b>",
    "P888",
    "gtacash",
    ".cc",
    "<font s",
    "sellix.io",
    "ezcars",
    "plano inicial",
    "rep +",
    "20r$",
    "l55.me",
    "trustpilot",
    "cashlounge",
    "fast delivery",
    "yosativa",
    "rich2day",
    "levellifters",
    ". com",
    "$1,000,000,000",
    "instant delivery",
    "0 ban risk",
    "discord for cheap money",
    "10-30m",
    "hey guys! tired of being poor?",
    "gta cash",
    "gta.cash",
    "discord todo",
    "扣扣",
    "传媒",
    "薇信",
    "维信",
    "首单",
    "包赔",
    "零封",
    "不封",
    "电玩",
    "业务",
    "刷金",
    "刷钱",
    "金币",
    "金条",
    "元起",
    "下单",
    "打金",
    "妹子",
    "低价",
    "高端",
    "视屏",
    "成入",
    "全罱",
    "售后",
    "Q群",
    "福利",
    "抖音",
    "加微",
    "美人",
    "强奸",
    "歪歪",
    "小程序",
    "淘宝",
    "店铺",
    "掏宝",
    "老哈",
    "微信搜",
    "美女",
    "萝",
    "网红",
    "偷拍",
    "传煤",
    "乱论",
    "情色",
];
