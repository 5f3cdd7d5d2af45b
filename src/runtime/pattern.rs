// 类名模板解析与后缀递增
// 模板与 printf 风格一致，必须且只能包含一个占位符：%c %d %x %X %s，可带宽度与 0 填充
use crate::api::Suffix;
use crate::errno::Errno;
use once_cell::sync::Lazy;
use regex::Regex;

static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"%(0)?([1-9][0-9]*)?([a-zA-Z%])").expect("placeholder regex is valid")
});

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Conversion {
    Char,
    Decimal,
    Hex { upper: bool },
    Str,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
struct Slot {
    conversion: Conversion,
    width: usize,
    zero_pad: bool,
}

// 解析后的类名模板：head + 占位符 + tail，%% 已还原为 %
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct NamePattern {
    source: String,
    head: String,
    tail: String,
    slot: Slot,
}

impl NamePattern {
    pub(crate) fn parse(text: &str) -> Result<Self, Errno> {
        if text.is_empty() {
            return Err(Errno::InvalidPattern);
        }

        let mut head = String::new();
        let mut tail = String::new();
        let mut slot = None;
        let mut cursor = 0usize;
        for caps in PLACEHOLDER.captures_iter(text) {
            let Some(whole) = caps.get(0) else {
                continue;
            };
            let literal = &text[cursor..whole.start()];
            if literal.contains('%') {
                return Err(Errno::InvalidPattern);
            }
            let out = if slot.is_some() { &mut tail } else { &mut head };
            out.push_str(literal);
            cursor = whole.end();

            let zero_pad = caps.get(1).is_some();
            let width = match caps.get(2) {
                Some(width) => width
                    .as_str()
                    .parse::<usize>()
                    .map_err(|_| Errno::InvalidPattern)?,
                None => 0,
            };
            let conversion = match &caps[3] {
                "%" if !zero_pad && width == 0 => {
                    let out = if slot.is_some() { &mut tail } else { &mut head };
                    out.push('%');
                    continue;
                }
                "c" => Conversion::Char,
                "d" => Conversion::Decimal,
                "x" => Conversion::Hex { upper: false },
                "X" => Conversion::Hex { upper: true },
                "s" => Conversion::Str,
                _ => return Err(Errno::InvalidPattern),
            };
            // 0 填充只对数值有意义，且必须配合宽度
            if zero_pad && (width == 0 || matches!(conversion, Conversion::Char | Conversion::Str)) {
                return Err(Errno::InvalidPattern);
            }
            if slot.is_some() {
                return Err(Errno::InvalidPattern);
            }
            slot = Some(Slot {
                conversion,
                width,
                zero_pad,
            });
        }

        let literal = &text[cursor..];
        if literal.contains('%') {
            return Err(Errno::InvalidPattern);
        }
        let Some(slot) = slot else {
            return Err(Errno::InvalidPattern);
        };
        tail.push_str(literal);

        Ok(Self {
            source: text.to_string(),
            head,
            tail,
            slot,
        })
    }

    pub(crate) fn as_str(&self) -> &str {
        &self.source
    }

    // %c 只接受字符后缀，%d/%x 只接受整数后缀，%s 两者皆可
    // 负数没有确定的十六进制宽度，%x/%X 只接受非负起点
    pub(crate) fn accepts(&self, suffix: Suffix) -> bool {
        match (self.slot.conversion, suffix) {
            (Conversion::Char, Suffix::Char(_)) => true,
            (Conversion::Decimal, Suffix::Int(_)) => true,
            (Conversion::Hex { .. }, Suffix::Int(value)) => value >= 0,
            (Conversion::Str, _) => true,
            _ => false,
        }
    }

    pub(crate) fn render(&self, suffix: Suffix) -> String {
        let width = self.slot.width;
        let value = match (self.slot.conversion, suffix) {
            (Conversion::Hex { upper }, Suffix::Int(value)) => match (upper, self.slot.zero_pad) {
                (false, false) => format!("{value:>width$x}"),
                (false, true) => format!("{value:0width$x}"),
                (true, false) => format!("{value:>width$X}"),
                (true, true) => format!("{value:0width$X}"),
            },
            (_, Suffix::Int(value)) if self.slot.zero_pad => format!("{value:0width$}"),
            (_, Suffix::Int(value)) => format!("{value:>width$}"),
            (_, Suffix::Char(value)) => format!("{value:>width$}"),
        };
        format!("{}{}{}", self.head, value, self.tail)
    }
}

// 后缀 +1：字符按码点递增，越过 Unicode 标量范围或整数溢出时返回 None
pub(crate) fn next_suffix(suffix: Suffix) -> Option<Suffix> {
    match suffix {
        Suffix::Char(value) => (value as u32)
            .checked_add(1)
            .and_then(char::from_u32)
            .map(Suffix::Char),
        Suffix::Int(value) => value.checked_add(1).map(Suffix::Int),
    }
}
