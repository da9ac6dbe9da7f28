//! ISBN 条码渲染
//!
//! ISBN 先规范化为 13 位 EAN，再编码为 95 个模块：
//! 起始符 `101` + 左侧 6 位 (L/G 码) + 中间符 `01010` + 右侧 6 位 (R 码) + 终止符 `101`。
//! 左侧的 L/G 组合由首位数字决定。

use crate::protocol::encode_component;
use std::fmt::Write;
use thiserror::Error;

pub const EAN13_MODULES: usize = 95;
/// 左右静区宽度（模块数）
const QUIET_ZONE: usize = 11;

const L_CODES: [u8; 10] = [
    0b0001101, 0b0011001, 0b0010011, 0b0111101, 0b0100011, 0b0110001, 0b0101111, 0b0111011,
    0b0110111, 0b0001011,
];
const G_CODES: [u8; 10] = [
    0b0100111, 0b0110011, 0b0011011, 0b0100001, 0b0011101, 0b0111001, 0b0000101, 0b0010001,
    0b0001001, 0b0010111,
];
const R_CODES: [u8; 10] = [
    0b1110010, 0b1100110, 0b1101100, 0b1000010, 0b1011100, 0b1001110, 0b1010000, 0b1000100,
    0b1001000, 0b1110100,
];
/// 首位数字 → 左侧 6 位是否使用 G 码（最高位对应第 2 位数字）
const PARITY: [u8; 10] = [
    0b000000, 0b001011, 0b001101, 0b001110, 0b010011, 0b011001, 0b011100, 0b010101, 0b010110,
    0b011010,
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BarcodeError {
    #[error("ISBN must have 10 or 13 digits, got {0}")]
    InvalidLength(usize),
    #[error("ISBN contains an invalid character '{0}'")]
    InvalidCharacter(char),
    #[error("ISBN check digit should be {expected}, found {found}")]
    ChecksumMismatch { expected: char, found: char },
}

// =========================================================
// ISBN 规范化
// =========================================================

/// 去掉连字符和空白，校验并转换为 ISBN-13
pub fn normalize_isbn(raw: &str) -> Result<String, BarcodeError> {
    let cleaned: String = raw
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .map(|c| c.to_ascii_uppercase())
        .collect();

    if let Some(c) = cleaned.chars().find(|c| !c.is_ascii_alphanumeric()) {
        return Err(BarcodeError::InvalidCharacter(c));
    }

    match cleaned.len() {
        10 => isbn10_to_13(&cleaned),
        13 => {
            let digits = parse_digits(&cleaned)?;
            let expected = ean_check_digit(&digits[..12]);
            if digits[12] != expected {
                return Err(BarcodeError::ChecksumMismatch {
                    expected: digit_char(expected),
                    found: digit_char(digits[12]),
                });
            }
            Ok(cleaned)
        }
        n => Err(BarcodeError::InvalidLength(n)),
    }
}

fn isbn10_to_13(isbn10: &str) -> Result<String, BarcodeError> {
    let body = parse_digits(&isbn10[..9])?;
    let last = isbn10.chars().last().unwrap_or('0');
    let found = match last {
        'X' => 10,
        c => c.to_digit(10).ok_or(BarcodeError::InvalidCharacter(c))? as u8,
    };

    let sum: u32 = body
        .iter()
        .enumerate()
        .map(|(i, d)| u32::from(*d) * (10 - i as u32))
        .sum();
    let expected = ((11 - sum % 11) % 11) as u8;
    if expected != found {
        return Err(BarcodeError::ChecksumMismatch {
            expected: if expected == 10 { 'X' } else { digit_char(expected) },
            found: last,
        });
    }

    let mut digits = vec![9, 7, 8];
    digits.extend_from_slice(&body);
    digits.push(ean_check_digit(&digits));
    Ok(digits.into_iter().map(digit_char).collect())
}

fn parse_digits(s: &str) -> Result<Vec<u8>, BarcodeError> {
    s.chars()
        .map(|c| {
            c.to_digit(10)
                .map(|d| d as u8)
                .ok_or(BarcodeError::InvalidCharacter(c))
        })
        .collect()
}

fn digit_char(d: u8) -> char {
    char::from(b'0' + d)
}

/// EAN-13 校验位（对前 12 位按 1,3,1,3... 加权）
pub fn ean_check_digit(first12: &[u8]) -> u8 {
    let sum: u32 = first12
        .iter()
        .enumerate()
        .map(|(i, d)| u32::from(*d) * if i % 2 == 0 { 1 } else { 3 })
        .sum();
    ((10 - sum % 10) % 10) as u8
}

// =========================================================
// EAN-13 编码
// =========================================================

/// 95 个模块，true 为黑条
pub fn ean13_modules(isbn: &str) -> Result<Vec<bool>, BarcodeError> {
    let normalized = normalize_isbn(isbn)?;
    let digits = parse_digits(&normalized)?;

    let mut modules = Vec::with_capacity(EAN13_MODULES);
    push_bits(&mut modules, 0b101, 3);

    let parity = PARITY[digits[0] as usize];
    for (i, d) in digits[1..7].iter().enumerate() {
        let use_g = parity & (1 << (5 - i)) != 0;
        let code = if use_g { G_CODES[*d as usize] } else { L_CODES[*d as usize] };
        push_bits(&mut modules, code, 7);
    }

    push_bits(&mut modules, 0b01010, 5);
    for d in &digits[7..13] {
        push_bits(&mut modules, R_CODES[*d as usize], 7);
    }
    push_bits(&mut modules, 0b101, 3);

    Ok(modules)
}

fn push_bits(out: &mut Vec<bool>, bits: u8, width: u32) {
    for shift in (0..width).rev() {
        out.push(bits & (1 << shift) != 0);
    }
}

// =========================================================
// SVG 渲染
// =========================================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BarcodeStyle {
    pub module_width: f32,
    pub bar_height: f32,
    pub font_size: f32,
}

impl Default for BarcodeStyle {
    fn default() -> Self {
        Self {
            module_width: 2.0,
            bar_height: 60.0,
            font_size: 14.0,
        }
    }
}

/// 渲染为独立 SVG 文档，下方带人类可读的 ISBN
pub fn render_svg(isbn: &str, style: BarcodeStyle) -> Result<String, BarcodeError> {
    let normalized = normalize_isbn(isbn)?;
    let modules = ean13_modules(&normalized)?;

    let total_modules = EAN13_MODULES + 2 * QUIET_ZONE;
    let width = total_modules as f32 * style.module_width;
    let height = style.bar_height + style.font_size * 1.6;

    let mut svg = String::new();
    // 写入 String 不会失败
    let _ = write!(
        svg,
        r##"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}"><rect width="100%" height="100%" fill="#ffffff"/>"##,
        w = width,
        h = height
    );

    // 相邻黑模块合并为一个矩形
    let mut i = 0;
    while i < modules.len() {
        if !modules[i] {
            i += 1;
            continue;
        }
        let start = i;
        while i < modules.len() && modules[i] {
            i += 1;
        }
        let x = (QUIET_ZONE + start) as f32 * style.module_width;
        let bar_width = (i - start) as f32 * style.module_width;
        let _ = write!(
            svg,
            r##"<rect x="{}" y="0" width="{}" height="{}" fill="#000000"/>"##,
            x, bar_width, style.bar_height
        );
    }

    let _ = write!(
        svg,
        r##"<text x="{}" y="{}" font-family="monospace" font-size="{}" text-anchor="middle">{}</text></svg>"##,
        width / 2.0,
        style.bar_height + style.font_size * 1.2,
        style.font_size,
        normalized
    );

    Ok(svg)
}

/// 可直接用于 `<img src>` 或下载链接的 data URI
pub fn svg_data_uri(isbn: &str, style: BarcodeStyle) -> Result<String, BarcodeError> {
    let svg = render_svg(isbn, style)?;
    Ok(format!("data:image/svg+xml;charset=utf-8,{}", encode_component(&svg)))
}

pub fn download_file_name(isbn: &str) -> String {
    let digits: String = isbn.chars().filter(char::is_ascii_alphanumeric).collect();
    format!("barcode-{}.svg", digits)
}
