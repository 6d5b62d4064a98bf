//! NPC persona prompts.
//!
//! The display name is matched against ordered archetype patterns; traits,
//! speech style and catchphrases are sampled from tables; the samples fill a
//! long narrative skeleton. The draft can then be expanded by the language
//! model, with local embellishment when the model is unavailable.

use std::sync::LazyLock;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::Rng;
use regex::Regex;

use super::template::{Bindings, Template, TemplateError};
use crate::llm::provider::ProviderKind;
use crate::llm::LanguageModel;
use crate::schema::npc::Persona;

pub const UNKNOWN_IDENTITY: &str = "未知身份";

struct Archetype {
    pattern: Regex,
    identity: &'static str,
    background: &'static str,
}

static ARCHETYPE_TABLE: [(&str, &str, &str); 20] = [
    ("菩萨|佛陀|罗汉|僧人|和尚", "寺庙中的佛教僧侣或神明", "自幼在寺庙修行，精通佛法，心怀慈悲，以普度众生为己任"),
    ("仙人|道长|道士|真人", "山中修行的道教仙人", "隐居深山多年，修炼道法，掌握炼丹、占卜等秘术，与世无争"),
    ("皇帝|国王|君主|陛下|王爷", "统治一方的君主", "出身皇室，从小接受帝王教育，肩负国家重任，深谙权术之道"),
    ("将军|元帅|士兵|校尉|武士", "战场上的军事将领", "久经沙场，战功赫赫，性格刚毅，忠诚勇猛，深受士兵爱戴"),
    ("书生|秀才|状元|学士|先生", "饱读诗书的文人", "十年寒窗苦读，学识渊博，心怀天下，渴望施展抱负"),
    ("商人|掌柜|老板|商贩", "精明的商人", "从小学徒做起，精通经营之道，走遍大江南北，见多识广"),
    ("工匠|铁匠|木匠|裁缝|艺人", "技艺精湛的工匠", "家族传承技艺，精益求精，对作品要求极高，追求完美"),
    ("医师|郎中|大夫|药师", "治病救人的医者", "祖传医术或拜师学艺，精通药理，心怀仁心，悬壶济世"),
    ("侠客|剑客|刀客|盗贼|刺客", "行走江湖的武林人士", "拜师学艺多年，武功高强，讲义气，游走四方，行侠仗义"),
    ("公主|郡主|贵妃|宫女|皇后", "宫廷中的女性贵族", "生于皇家或选秀入宫，精通琴棋书画，深谙宫廷礼仪与生存之道"),
    ("农民|渔夫|猎人|樵夫", "淳朴的乡村劳动者", "世代居住乡村，熟悉自然，勤劳朴实，性格憨厚，热爱土地"),
    ("厨师|酒保|店小二|掌柜", "餐饮行业从业者", "从小在酒楼学习厨艺或经营，熟悉各种美食，善于与人打交道"),
    ("巫师|萨满|祭司|先知", "沟通神灵的宗教人士", "继承神秘传承，能够与神灵沟通，预测未来，举行宗教仪式"),
    ("官员|县令|知府|御史|大臣", "朝廷官员", "科举出身或世袭官位，熟悉官场规则，有自己的政治理想和手段"),
    ("艺人|歌妓|舞姬|乐师|戏子", "表演艺术从业者", "自幼学习歌舞乐器，技艺精湛，情感丰富，见惯人情冷暖"),
    ("海盗|土匪|恶霸|马贼", "游离于法律之外的武装人员", "因生活所迫或性格使然落草为寇，性格凶狠，讲义气，有自己的生存之道"),
    ("学者|博士|先生|教授", "知识渊博的学者", "一生追求知识，研究学问，性格严谨，诲人不倦，淡泊名利"),
    ("发明家|工匠|技师|巧匠", "擅长创造的发明家", "对机械和工艺有天赋，喜欢钻研，创造出许多新奇实用的装置"),
    ("隐士|居士|高人|逸民", "隐居世外的高人", "曾经历繁华或官场，后选择归隐，看透世事，淡泊名利，智慧高深"),
    ("占卜师|相士|算命先生|风水师", "预测未来的玄学大师", "掌握占卜、相面、风水等技艺，能看透人的命运和事物的发展"),
];

static ARCHETYPES: LazyLock<Vec<Archetype>> = LazyLock::new(|| {
    ARCHETYPE_TABLE
        .iter()
        .map(|&(pattern, identity, background)| Archetype {
            pattern: Regex::new(pattern).unwrap(),
            identity,
            background,
        })
        .collect()
});

// Checked in order; the first match picks the catchphrase group.
static CATCHPHRASE_GROUPS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    [
        ("菩萨|和尚|佛陀", "佛教"),
        ("道士|仙人|道长", "道教"),
        ("将军|士兵|武士", "武将"),
        ("商人|掌柜|老板", "商人"),
        ("侠客|剑客|刀客", "侠客"),
        ("官员|县令|皇帝", "官员"),
    ]
    .into_iter()
    .map(|(pattern, group)| (Regex::new(pattern).unwrap(), group))
    .collect()
});

const DEFAULT_CATCHPHRASE_GROUP: &str = "文人";

static TRAITS: [(&str, [&str; 8]); 8] = [
    ("温和", ["温和友善", "待人宽容", "有耐心", "善解人意", "不争强好胜", "乐于助人", "性格沉稳", "不易动怒"]),
    ("暴躁", ["性格急躁", "容易发怒", "缺乏耐心", "直言不讳", "冲动行事", "爱恨分明", "讲义气", "重感情"]),
    ("幽默", ["风趣幽默", "喜欢开玩笑", "乐观开朗", "善于活跃气氛", "机智过人", "反应敏捷", "自嘲自黑", "生活态度轻松"]),
    ("严肃", ["不苟言笑", "做事认真", "严谨细致", "注重规则", "责任感强", "理性冷静", "沉默寡言", "追求完美"]),
    ("狡猾", ["聪明机智", "善于算计", "见风使舵", "口齿伶俐", "不吃亏", "灵活应变", "表面热情", "内心算计"]),
    ("憨厚", ["朴实无华", "待人真诚", "诚实守信", "不善言辞", "乐于助人", "容易相信别人", "做事踏实", "心地善良"]),
    ("多疑", ["谨慎小心", "不易相信他人", "观察力强", "考虑周全", "防备心重", "善于发现细节", "不轻易表露内心", "思维缜密"]),
    ("浪漫", ["情感丰富", "善于表达", "追求美好", "感性大于理性", "喜欢幻想", "注重仪式感", "容易被感动", "富有创造力"]),
];

static SPEECH_STYLES: [(&str, &str); 8] = [
    ("温和", "语气轻柔舒缓，语速适中，用词礼貌，常用敬语，很少打断别人，说话时喜欢用\"请\"、\"麻烦您\"、\"谢谢\"等礼貌用语"),
    ("豪爽", "语气洪亮有力，语速较快，用词直接，不拘小节，喜欢拍着对方肩膀说话，常用俚语和粗话，笑声爽朗"),
    ("文雅", "语气平和优雅，语速较慢，用词考究，喜欢引用诗词典故，说话条理清晰，举止得体，注重礼仪"),
    ("幽默", "语气轻松活泼，语速多变，用词风趣，喜欢开玩笑和使用双关语，表情丰富，肢体语言夸张"),
    ("严肃", "语气庄重沉稳，语速均匀，用词准确，很少有多余的词汇，表情严肃，举止规范，注重逻辑和事实"),
    ("神秘", "语气低沉沙哑，语速缓慢，用词隐晦，喜欢使用比喻和暗示，常说一半留一半，眼神深邃，让人捉摸不透"),
    ("天真", "语气清脆，语速快，用词简单直接，有孩子气，喜欢提问，表情丰富，容易相信别人"),
    ("傲慢", "语气轻蔑，语速缓慢，用词挑剔，常带有讽刺意味，喜欢打断别人，表情不屑，姿态高傲"),
];

static CATCHPHRASES: [(&str, [&str; 7]); 7] = [
    ("佛教", ["阿弥陀佛", "善哉善哉", "施主", "苦海无边，回头是岸", "我佛慈悲", "缘分自有天定", "色即是空，空即是色"]),
    ("道教", ["无量天尊", "贫道", "顺其自然", "道法自然", "长生久视", "阴阳调和", "五行相生相克"]),
    ("武将", ["岂有此理", "放马过来", "哈哈哈", "看招", "岂敢", "末将遵命", "战死沙场，在所不辞"]),
    ("文人", ["学而时习之", "不亦乐乎", "正所谓", "在下以为", "久仰大名", "失敬失敬", "书中自有黄金屋"]),
    ("商人", ["有钱能使鬼推磨", "一分钱一分货", "童叟无欺", "买卖不成仁义在", "发财发财", "见笑见笑", "好说好说"]),
    ("侠客", ["路见不平，拔刀相助", "在下", "承让", "得罪了", "后会有期", "青山不改，绿水长流", "江湖险恶，多加小心"]),
    ("官员", ["本官", "岂有此理", "荒谬", "此事定当严查", "依律处置", "上报朝廷", "为民做主"]),
];

const LIFE_EVENTS: &[&str] = &[
    "年轻时曾经历过一次重大挫折，使他明白了人生的真谛",
    "曾遇到一位贵人指点，从此改变了人生方向",
    "有一个深藏心底的秘密，从不轻易告诉别人",
    "正在追寻一个重要目标，为此不惜一切代价",
    "曾经失去过重要的人或物，因此性格发生了巨大变化",
    "拥有一项独特的技能或天赋，是家族或门派的传承",
    "背负着一个沉重的责任或诅咒，无法摆脱",
    "正在逃避某个人或某种势力的追杀",
];
const UPBRINGINGS: &[&str] = &["生活在一个普通家庭", "失去双亲，由他人抚养长大", "被特殊组织培养", "在偏远地区独自生活"];
const YOUTHS: &[&str] = &["从小就展现出非凡的天赋", "经历了许多磨难", "受到良好的教育", "一直过着平凡的生活"];
const HABITS: &[&str] = &[
    "说话时喜欢用手比划，肢体语言丰富",
    "思考时会下意识地摸自己的下巴或头发",
    "紧张时会不停地踱步或搓手",
    "高兴时会放声大笑，毫不掩饰自己的情绪",
    "生气时会板起脸，沉默不语，眼神变得锐利",
    "喜欢一边说话一边喝茶或喝酒",
    "说话时总是直视对方的眼睛，显得非常真诚",
    "习惯在固定的时间做固定的事情，生活很有规律",
];
const VALUES: &[&str] = &[
    "重视友情，认为朋友比金钱更重要",
    "追求真理，凡事都要弄个明白",
    "以和为贵，尽量避免冲突",
    "相信命运，认为一切都是上天安排",
    "努力奋斗，相信人定胜天",
    "重视家庭，愿意为家人付出一切",
    "追求自由，不愿受到束缚",
    "乐于助人，认为帮助别人是一种快乐",
];
const ATTITUDES: &[&str] = &[
    "对陌生人保持警惕，但熟悉后会非常热情",
    "待人友善，无论对谁都一视同仁",
    "看不起权贵，但尊重有真才实学的人",
    "喜欢结交朋友，四海之内皆兄弟",
    "性格孤僻，不喜欢与人交往",
    "只与志同道合的人深交，否则只是表面应付",
    "对长辈非常尊敬，对晚辈十分照顾",
    "根据对方的身份地位改变态度，非常现实",
];
const JOY: &[&str] = &["开怀大笑，手舞足蹈", "请对方喝酒庆祝", "分享自己的喜悦", "变得更加健谈"];
const ANGER: &[&str] = &["沉默不语，脸色铁青", "大声呵斥，毫不留情", "摔东西发泄", "转身离开，不愿多谈"];
const SORROW: &[&str] = &["独自默默流泪", "借酒消愁", "向信任的人倾诉", "把自己关起来"];
const OUTLOOKS: &[&str] = &[
    "积极乐观，总是看到事情好的一面",
    "悲观谨慎，凡事都做最坏的打算",
    "随遇而安，不强求任何事情",
    "追求极致，对自己要求严格",
];
const PHILOSOPHIES: &[&str] = &[
    "人生如梦，及时行乐",
    "吃得苦中苦，方为人上人",
    "善恶终有报，天道好轮回",
    "走自己的路，让别人说去吧",
    "君子爱财，取之有道",
];
const MANNERS: &[&str] = &[
    "喜欢讲笑话活跃气氛",
    "善于倾听，很少打断别人",
    "总是直言不讳，不怕得罪人",
    "说话委婉，不直接表达自己的想法",
    "喜欢提问，了解对方的想法",
];
const CONFIDENCE: &[&str] = &[
    "对自己的专业领域非常自信，侃侃而谈",
    "谦虚谨慎，从不炫耀自己的成就",
    "喜欢炫耀自己的经历和知识",
    "沉默寡言，只有在必要时才开口",
];
const SECRETS: &[&str] = &[
    "曾经做过一件让自己后悔终生的事",
    "隐藏着一个重要身份",
    "拥有一件珍贵但危险的物品",
    "暗恋着某个人",
    "身负重要使命",
];
const SECRET_EFFECTS: &[&str] = &["常常夜不能寐", "对某些话题特别敏感", "刻意避开某些地方或人物", "养成了某种特殊习惯"];
const GOALS: &[&str] = &[
    "成为行业中的顶尖人物",
    "保护自己重要的人",
    "追求真理和智慧",
    "积累财富，改善生活",
    "为社会做出贡献",
    "寻找人生的意义",
];
const APPROACHES: &[&str] = &["努力学习，不断提升自己", "广结善缘，积累人脉", "不畏艰难，勇于冒险", "精打细算，步步为营"];
const ADVICE: &[&str] = &["不要提及他的过去", "多倾听他的意见", "尊重他的习惯", "不要轻易开玩笑", "真诚相待，不要虚伪"];
const INTERESTS: &[&str] = &["美食", "艺术", "历史", "冒险", "哲学"];
const EXCITEMENT: &[&str] = &["非常兴奋", "滔滔不绝", "眉飞色舞", "打开话匣子"];

// Embellishment tables for when the model is unavailable.
const EXTRA_TRAITS: &[&str] = &[
    "做事认真负责，注重细节",
    "性格开朗，喜欢开玩笑",
    "沉默寡言，但内心善良",
    "好奇心强，对新事物充满兴趣",
    "固执己见，坚持自己的原则",
    "乐于助人，不计较个人得失",
    "急躁冲动，常常不加思考行动",
    "沉稳冷静，面对困难不慌张",
];
const EXTRA_HABITS: &[&str] = &[
    "喜欢在思考时自言自语",
    "经常摆弄手指或身边的小物件",
    "说话时习惯用手势辅助表达",
    "紧张时会不自觉地踱步",
    "思考问题时喜欢闭上眼睛",
    "高兴时会哼起小曲",
];
const EXTRA_CATCHPHRASES: &[&str] = &["这可真是有意思啊", "让我想想...", "没问题，交给我吧", "说起来...", "依我看...", "说真的..."];
const HOBBIES: &[&str] = &["收集古董", "弹奏乐器", "研究星象", "烹饪奇特食物", "写诗歌"];
const CONTRASTS: &[&str] = &["职业", "背景", "性格"];
const UNDER_PRESSURE: &[&str] = &["变得异常冷静", "语速加快", "开始踱步", "沉默不语", "开玩笑缓解气氛"];
const SIGNATURE_MOVES: &[&str] = &[
    "经常抚摸自己的胡须",
    "不自觉地轻敲手指",
    "整理衣领",
    "眼神游离望向远方",
    "双手交叉放在胸前",
];

pub const DEFAULT_SKELETON: &str = "{name}是一位{identity}，他的性格{traits}。{background}

他的说话风格{speech}。常说的口头禅有\"{catchphrases}\"等。

他的行为习惯有：{habit_a}；{habit_b}。在不同情绪下表现也不同：开心时会{joy}；生气时会{anger}；悲伤时会{sorrow}。

他的价值观是{value}。{attitude}。他对生活的态度{outlook}。

他有自己独特的人生哲学：\"{philosophy}\"。

在与他人交往时，他{manner}。他{confidence}。

他有一个不为人知的秘密：{secret}。这个秘密让他{secret_effect}。

他的人生目标是{goal}。为了实现这个目标，他{approach}。

与他交流时，应该注意{advice}。他对{interest}特别感兴趣，如果谈论这些话题，他会变得{excitement}。";

/// Identity inferred from a display name.
#[derive(Debug, Clone, PartialEq)]
pub struct Identity {
    pub identity: String,
    /// Present only when an archetype pattern matched.
    pub background: Option<&'static str>,
}

/// First archetype whose pattern matches `name`; otherwise the role, or 未知身份.
pub fn identify(name: &str, role: &str) -> Identity {
    match ARCHETYPES.iter().find(|a| a.pattern.is_match(name)) {
        Some(a) => Identity {
            identity: a.identity.to_string(),
            background: Some(a.background),
        },
        None => Identity {
            identity: if role.trim().is_empty() {
                UNKNOWN_IDENTITY.to_string()
            } else {
                role.trim().to_string()
            },
            background: None,
        },
    }
}

/// Catchphrase group for a display name. Defaults to 文人.
pub fn catchphrase_group(name: &str) -> &'static str {
    CATCHPHRASE_GROUPS
        .iter()
        .find(|(re, _)| re.is_match(name))
        .map(|(_, group)| *group)
        .unwrap_or(DEFAULT_CATCHPHRASE_GROUP)
}

/// Key into the trait table for an editor personality tag.
pub fn trait_table_key(personality: &str, rng: &mut StdRng) -> &'static str {
    let personality = personality.trim();
    if let Some((key, _)) = TRAITS.iter().find(|(k, _)| *k == personality) {
        return *key;
    }
    match personality {
        "友好" => "温和",
        "敌对" => "暴躁",
        _ => TRAITS.choose(rng).map(|(k, _)| *k).unwrap_or("温和"),
    }
}

fn traits_for(key: &str) -> &'static [&'static str] {
    TRAITS
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, t)| t.as_slice())
        .unwrap_or(&[])
}

fn speech_style(pattern: &str, rng: &mut StdRng) -> &'static str {
    let pattern = pattern.trim();
    SPEECH_STYLES
        .iter()
        .find(|(k, _)| *k == pattern)
        .or_else(|| SPEECH_STYLES.choose(rng))
        .map(|(_, s)| *s)
        .unwrap_or_default()
}

fn catchphrases_for(group: &str) -> &'static [&'static str] {
    CATCHPHRASES
        .iter()
        .find(|(k, _)| *k == group)
        .map(|(_, c)| c.as_slice())
        .unwrap_or(&[])
}

fn one(items: &[&'static str], rng: &mut StdRng) -> &'static str {
    items.choose(rng).copied().unwrap_or_default()
}

fn several(items: &[&'static str], min: usize, max: usize, rng: &mut StdRng) -> Vec<&'static str> {
    let count = rng.gen_range(min..=max);
    items.choose_multiple(rng, count).copied().collect()
}

pub struct PersonaGenerator {
    skeleton: String,
}

impl Default for PersonaGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl PersonaGenerator {
    pub fn new() -> Self {
        Self {
            skeleton: DEFAULT_SKELETON.to_string(),
        }
    }

    /// Use a custom narrative skeleton. Unknown slots fail the draft.
    pub fn with_skeleton(skeleton: impl Into<String>) -> Self {
        Self {
            skeleton: skeleton.into(),
        }
    }

    /// Fill the skeleton for `persona`.
    pub fn draft(&self, persona: &Persona, rng: &mut StdRng) -> Result<String, TemplateError> {
        let template = Template::parse(&self.skeleton)?;
        let identity = identify(&persona.name, &persona.role);

        let traits = several(traits_for(trait_table_key(&persona.personality, rng)), 5, 7, rng);
        let speech = speech_style(&persona.speech_pattern, rng);
        let phrases = several(catchphrases_for(catchphrase_group(&persona.name)), 2, 3, rng);

        let background = match identity.background {
            Some(bg) => format!(
                "{}的身份是{}。{}。他{}。",
                persona.name,
                identity.identity,
                bg,
                one(LIFE_EVENTS, rng)
            ),
            None => format!(
                "{}是一位{}。他从小{}，{}。",
                persona.name,
                identity.identity,
                one(UPBRINGINGS, rng),
                one(YOUTHS, rng)
            ),
        };
        let habits = several(HABITS, 2, 2, rng);

        let mut b = Bindings::new();
        b.set("name", persona.name.as_str())
            .set("identity", identity.identity.as_str())
            .set("traits", traits.join("、"))
            .set("background", background)
            .set("speech", speech)
            .set("catchphrases", phrases.join("\"、\""))
            .set("habit_a", habits.first().copied().unwrap_or_default())
            .set("habit_b", habits.get(1).copied().unwrap_or_default())
            .set("joy", one(JOY, rng))
            .set("anger", one(ANGER, rng))
            .set("sorrow", one(SORROW, rng))
            .set("value", one(VALUES, rng))
            .set("attitude", one(ATTITUDES, rng))
            .set("outlook", one(OUTLOOKS, rng))
            .set("philosophy", one(PHILOSOPHIES, rng))
            .set("manner", one(MANNERS, rng))
            .set("confidence", one(CONFIDENCE, rng))
            .set("secret", one(SECRETS, rng))
            .set("secret_effect", one(SECRET_EFFECTS, rng))
            .set("goal", one(GOALS, rng))
            .set("approach", one(APPROACHES, rng))
            .set("advice", one(ADVICE, rng))
            .set("interest", one(INTERESTS, rng))
            .set("excitement", one(EXCITEMENT, rng));

        template.render(&b)
    }

    /// Draft plus a 补充细节 paragraph.
    pub fn embellish(draft: &str, rng: &mut StdRng) -> String {
        format!(
            "{}\n\n补充细节：{}，{}。常说的口头禅有\"{}\"。该角色有一个秘密爱好是{}，这与他的{}形成了有趣的对比。在紧张情况下，他会{}。他的标志性动作是{}。",
            draft,
            one(EXTRA_TRAITS, rng),
            one(EXTRA_HABITS, rng),
            one(EXTRA_CATCHPHRASES, rng),
            one(HOBBIES, rng),
            one(CONTRASTS, rng),
            one(UNDER_PRESSURE, rng),
            one(SIGNATURE_MOVES, rng)
        )
    }

    /// One-line prompt used when the skeleton cannot be filled.
    pub fn reduced(persona: &Persona, rng: &mut StdRng) -> String {
        let identity = identify(&persona.name, &persona.role);
        let key = trait_table_key(&persona.personality, rng);
        format!(
            "基于角色名\"{}\"生成的人设：{}，性格{}，{}。",
            persona.name,
            identity.identity,
            one(traits_for(key), rng),
            one(EXTRA_HABITS, rng)
        )
    }

    /// Local result only: the draft, or the reduced prompt if the skeleton is broken.
    pub fn generate_offline(&self, persona: &Persona, rng: &mut StdRng) -> String {
        match self.draft(persona, rng) {
            Ok(draft) => draft,
            Err(e) => {
                log::warn!("persona skeleton failed for {}: {}", persona.name, e);
                Self::reduced(persona, rng)
            }
        }
    }

    /// Draft, then ask the model for an expanded version.
    ///
    /// The model's text replaces the draft only when it is at least as long.
    /// A failed call keeps the draft with an embellishment paragraph.
    pub async fn generate(&self, llm: &LanguageModel, persona: &Persona, rng: &mut StdRng) -> String {
        let draft = match self.draft(persona, rng) {
            Ok(draft) => draft,
            Err(e) => {
                log::warn!("persona skeleton failed for {}: {}", persona.name, e);
                return Self::reduced(persona, rng);
            }
        };

        let designer = Persona::new("人设提示词生成器", "游戏角色设计师", "专业", "详细");
        let request = format!(
            "基于以下基本人设信息，扩展生成一段500字左右的详细NPC人设提示词，保持原有核心特征但丰富细节：\n\n{}",
            draft
        );

        match llm
            .try_converse(&designer, &request, Some(ProviderKind::DoubaoThinkingPro))
            .await
        {
            Ok(text) if text.chars().count() >= draft.chars().count() => text,
            Ok(_) => {
                log::debug!("expanded persona shorter than draft, keeping draft");
                draft
            }
            Err(e) => {
                log::warn!("persona expansion failed ({:?}): {}", e.kind(), e);
                Self::embellish(&draft, rng)
            }
        }
    }
}
