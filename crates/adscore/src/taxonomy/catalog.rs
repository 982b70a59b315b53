use serde::Serialize;

/// One facet of an ad type's taxonomy and the tags that may be selected in it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DimensionSpec {
    pub name: &'static str,
    pub tags: &'static [&'static str],
}

const THEME: &[&str] = &[
    "情感关系联结",
    "社会洞察关怀",
    "文化价值联结",
    "生活方式理念",
    "自我态度表达",
    "幽默潮流娱乐",
    "产品功能主张",
];

const SCENE: &[&str] = &[
    "家庭与私密空间",
    "消费商业街区",
    "生产学习空间",
    "城市公共空间",
    "自然与户外探索",
    "虚拟与虚构空间",
];

const TONE: &[&str] = &[
    "温暖治愈",
    "幽默魔性",
    "轻松明快",
    "高级质感",
    "热血励志",
    "科技酷感",
    "理性客观",
    "质朴真诚",
    "悬疑紧张",
    "人文厚重",
    "文艺清新",
];

const EMOTIONAL_APPEAL: &[&str] = &[
    "温馨感动",
    "轻松愉悦",
    "向往憧憬",
    "认同归属",
    "震撼惊奇",
    "安心信任",
    "理性信服",
    "好奇探索",
    "价值激励",
];

const PLACEMENT_STYLE: &[&str] = &["软广", "硬广"];

const LIVE_SCENE: &[&str] = &[
    "背景板直播间及虚拟场景",
    "源头场景",
    "生产场景",
    "实体卖场场景",
    "户外移动场景",
];

const NARRATIVE_STYLE: &[&str] = &["产品介绍", "场景代入", "角色扮演", "故事叙事", "用户证言"];

pub(super) const LONG_VIDEO: &[DimensionSpec] = &[
    DimensionSpec {
        name: "主题",
        tags: THEME,
    },
    DimensionSpec {
        name: "场景",
        tags: SCENE,
    },
    DimensionSpec {
        name: "调性",
        tags: TONE,
    },
];

pub(super) const SHORT_VIDEO: &[DimensionSpec] = &[
    DimensionSpec {
        name: "主题",
        tags: THEME,
    },
    DimensionSpec {
        name: "场景",
        tags: SCENE,
    },
];

pub(super) const IMAGE_TEXT: &[DimensionSpec] = &[
    DimensionSpec {
        name: "主题",
        tags: THEME,
    },
    DimensionSpec {
        name: "情绪唤起",
        tags: EMOTIONAL_APPEAL,
    },
];

pub(super) const PRINT: &[DimensionSpec] = IMAGE_TEXT;

pub(super) const ANIMATION: &[DimensionSpec] = &[DimensionSpec {
    name: "主题",
    tags: THEME,
}];

pub(super) const AUDIO: &[DimensionSpec] = &[
    DimensionSpec {
        name: "主题",
        tags: THEME,
    },
    DimensionSpec {
        name: "软硬",
        tags: PLACEMENT_STYLE,
    },
];

pub(super) const LIVE_COMMERCE: &[DimensionSpec] = &[
    DimensionSpec {
        name: "场景维度",
        tags: LIVE_SCENE,
    },
    DimensionSpec {
        name: "叙事风格",
        tags: NARRATIVE_STYLE,
    },
];

pub(super) const CATALOGUE_ONLY: &[DimensionSpec] = &[];
