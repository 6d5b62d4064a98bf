//! Random props and puzzle scripts for the scene editor.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::image::{placeholder_url, ImageFacade, SQUARE};
use crate::schema::scene::new_id;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedProp {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub category: String,
    pub description: String,
    pub knowledge: String,
    pub image_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PuzzleScript {
    pub id: String,
    pub title: String,
    pub description: String,
    pub clue: String,
    pub solution: String,
    pub knowledge: String,
}

struct PropKind {
    category: &'static str,
    names: [&'static str; 5],
    description: &'static str,
    knowledge: &'static str,
}

static PROP_KINDS: [PropKind; 8] = [
    PropKind {
        category: "钥匙",
        names: ["古老钥匙", "黄铜钥匙", "生锈钥匙", "华丽钥匙", "水晶钥匙"],
        description: "一把看起来很古老的钥匙，可能能打开某个神秘的箱子或门。",
        knowledge: "在古代，钥匙不仅是开锁工具，也象征着权力和地位。贵族家庭会用复杂设计的钥匙来展示自己的身份。",
    },
    PropKind {
        category: "卷轴",
        names: ["神秘卷轴", "破损卷轴", "魔法卷轴", "地图卷轴", "咒语卷轴"],
        description: "一卷用特殊材料制成的卷轴，上面似乎写着某种文字或图案。",
        knowledge: "纸张发明前，人们常用羊皮纸或纸草制作卷轴记录重要信息。许多古代文献都是以卷轴形式保存下来的。",
    },
    PropKind {
        category: "地图",
        names: ["残缺地图", "藏宝图", "区域地图", "古代地图", "手绘地图"],
        description: "一张绘制着未知区域的地图，标记着几个神秘的地点。",
        knowledge: "古代地图制作技术有限，但依然能准确反映地理特征。有些地图还包含神话元素和想象中的生物。",
    },
    PropKind {
        category: "日记",
        names: ["旧日记", "秘密日记", "探险家日记", "学者笔记", "加密日记"],
        description: "某人的私人日记，记录着日常琐事和一些秘密。",
        knowledge: "日记是研究历史的重要资料，能让我们了解过去人们的日常生活和思想。著名的《安妮日记》就是二战时期的重要记录。",
    },
    PropKind {
        category: "符号",
        names: ["神秘符号", "古代符文", "金属徽章", "石刻符号", "图腾标记"],
        description: "刻有奇怪图案的符号，可能代表某种古老的语言或信仰。",
        knowledge: "符号学是研究符号和象征的学问。古代文明常使用符号来传递信息、表达信仰或记录历史事件。",
    },
    PropKind {
        category: "雕像",
        names: ["小雕像", "神像", "动物雕像", "人物雕像", "抽象雕塑"],
        description: "一个小巧的雕像，做工精细，表情栩栩如生。",
        knowledge: "雕像艺术在不同文明中有不同风格，反映了当时的审美观念和技术水平。古希腊雕像以比例精准著称。",
    },
    PropKind {
        category: "宝石",
        names: ["发光宝石", "彩色宝石", "透明水晶", "稀有矿石", "能量晶石"],
        description: "一块闪闪发光的宝石，在光线下呈现出迷人的色彩。",
        knowledge: "宝石的价值取决于其稀有度、颜色和切割工艺。有些宝石还被认为具有特殊能量或治疗功效。",
    },
    PropKind {
        category: "工具",
        names: ["生锈工具", "特殊工具", "古代仪器", "测量工具", "修理工具"],
        description: "一件看起来很专业的工具，不知道曾经被用来做什么。",
        knowledge: "工具的发明和使用是人类文明进步的重要标志。从简单石器到复杂机械，工具不断推动着社会发展。",
    },
];

struct PuzzleKind {
    category: &'static str,
    titles: [&'static str; 5],
    clue: &'static str,
    solution: &'static str,
    knowledge: &'static str,
}

static PUZZLE_KINDS: [PuzzleKind; 5] = [
    PuzzleKind {
        category: "密码",
        titles: ["数字密码锁", "字母密码", "符号组合", "颜色密码", "声音密码"],
        clue: "墙上刻着一行小字：\"从1开始，到5结束，每个数字只出现一次\"",
        solution: "14253",
        knowledge: "密码学有着悠久的历史，古代就有各种加密信息的方法。凯撒密码是一种简单的替换密码，将字母按一定位数移位。",
    },
    PuzzleKind {
        category: "谜语",
        titles: ["自然之谜", "物品谜语", "人物谜语", "地点谜语", "抽象谜语"],
        clue: "我有许多牙齿，却不能咬东西。我是什么？",
        solution: "梳子",
        knowledge: "谜语是一种传统的智力游戏，通常由描述性的语言构成，需要通过联想和推理来猜出答案。",
    },
    PuzzleKind {
        category: "逻辑题",
        titles: ["排列问题", "推理游戏", "数学谜题", "逻辑序列", "模式识别"],
        clue: "根据前三个图形的规律，第四个图形应该是什么？",
        solution: "选择包含三个三角形和两个圆形的图形",
        knowledge: "逻辑思维是人类认知的基本能力之一，通过解决逻辑题可以锻炼我们的推理和分析能力。",
    },
    PuzzleKind {
        category: "图案",
        titles: ["图案拼接", "符号转换", "图像谜题", "视觉错觉", "隐藏图案"],
        clue: "这些符号似乎与天上的星星有关，试着按照星座排列它们",
        solution: "按照猎户座的形状排列符号",
        knowledge: "图案识别是人类视觉系统的重要功能，我们的大脑擅长从复杂的图像中发现规律和模式。",
    },
    PuzzleKind {
        category: "文字游戏",
        titles: ["字谜", "成语接龙", "词语替换", "藏头诗", "密码信"],
        clue: "将这些字母重新排列，可以组成一个与\"知识\"相关的词语",
        solution: "智慧",
        knowledge: "文字游戏不仅有趣，还能增强语言能力和创造力。双关语、字谜等都是常见的文字游戏形式。",
    },
];

pub fn prop_categories() -> impl Iterator<Item = &'static str> {
    PROP_KINDS.iter().map(|k| k.category)
}

pub fn puzzle_categories() -> impl Iterator<Item = &'static str> {
    PUZZLE_KINDS.iter().map(|k| k.category)
}

pub fn prop_image_prompt(name: &str, category: &str) -> String {
    format!("game prop, {}, {}, simple style, 8k, high quality", name, category)
}

fn millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

// Category and name, uniformly.
fn sample_prop(rng: &mut StdRng) -> (&'static PropKind, &'static str) {
    let kind = PROP_KINDS.choose(rng).unwrap_or(&PROP_KINDS[0]);
    let name = kind.names.choose(rng).copied().unwrap_or(kind.names[0]);
    (kind, name)
}

fn build_prop(kind: &PropKind, name: &str, image_url: String) -> GeneratedProp {
    GeneratedProp {
        id: new_id("prop"),
        name: name.to_string(),
        category: kind.category.to_string(),
        description: kind.description.to_string(),
        knowledge: kind.knowledge.to_string(),
        image_url,
    }
}

/// A random prop with a placeholder image URL. No network access.
pub fn random_prop(rng: &mut StdRng, placeholder_base: &str) -> GeneratedProp {
    let (kind, name) = sample_prop(rng);
    let prompt = prop_image_prompt(name, kind.category);
    let url = placeholder_url(placeholder_base, SQUARE, &prompt, &format!("prop_{}", millis()));
    build_prop(kind, name, url)
}

/// A random prop whose image comes from the image façade.
pub async fn random_prop_with_image(images: &ImageFacade, rng: &mut StdRng) -> GeneratedProp {
    let (kind, name) = sample_prop(rng);
    let prompt = prop_image_prompt(name, kind.category);
    let url = images.generate_image(&prompt, &[]).await;
    build_prop(kind, name, url)
}

pub fn random_puzzle(rng: &mut StdRng) -> PuzzleScript {
    let kind = PUZZLE_KINDS.choose(rng).unwrap_or(&PUZZLE_KINDS[0]);
    let title = kind.titles.choose(rng).copied().unwrap_or(kind.titles[0]);
    PuzzleScript {
        id: new_id("puzzle"),
        title: title.to_string(),
        description: format!("一个{}谜题，解开它可能会获得重要线索。", kind.category),
        clue: kind.clue.to_string(),
        solution: kind.solution.to_string(),
        knowledge: kind.knowledge.to_string(),
    }
}
