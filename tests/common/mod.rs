//! Helpers for building compressed streams out of explicit tokens.
#![allow(dead_code)]

use lzss_rs::{assemble_code, FieldSplit, FormatParams, Order, FLAG_BITS};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token {
    Literal(u8),
    /// Raw length field (before the threshold) and offset
    Ref { length: usize, offset: usize },
}

/// Serialize tokens into a stream for `params`
///
/// The last control byte is padded with zero literals, the way BIOS-targeted
/// tools pad their output.
pub fn serialize(tokens: &[Token], params: &FormatParams) -> Vec<u8> {
    serialize_groups(tokens, params).concat()
}

/// Serialized control groups, one control byte and its codes each
pub fn serialize_groups(tokens: &[Token], params: &FormatParams) -> Vec<Vec<u8>> {
    let mut out = Vec::new();
    for group in tokens.chunks(FLAG_BITS as usize) {
        let mut flags = 0u8;
        let mut body = Vec::new();
        for (round, tok) in group.iter().enumerate() {
            match *tok {
                Token::Literal(b) => body.push(b),
                Token::Ref { length, offset } => {
                    flags |= 0x80 >> round;
                    body.extend_from_slice(&encode_ref(length, offset, params));
                }
            }
        }
        body.resize(body.len() + FLAG_BITS as usize - group.len(), 0);
        let mut serialized = vec![flags];
        serialized.extend_from_slice(&body);
        out.push(serialized);
    }
    out
}

fn encode_ref(length: usize, offset: usize, params: &FormatParams) -> Vec<u8> {
    let code = match params.split() {
        FieldSplit::LengthHigh => ((length as u32) << params.offset_bits()) | offset as u32,
        FieldSplit::LengthLow => ((offset as u32) << params.length_bits()) | length as u32,
    };
    let n = params.reference_bytes();
    let be = code.to_be_bytes();
    let mut bytes = be[4 - n..].to_vec();
    if params.order() == Order::Lsb {
        bytes.reverse();
    }
    debug_assert_eq!(assemble_code(&bytes, params.order()), code);
    bytes
}

/// What a correct decoder outputs for `tokens`, including padding
pub fn expected(tokens: &[Token], params: &FormatParams) -> Vec<u8> {
    let mut out: Vec<u8> = Vec::new();
    for tok in tokens {
        match *tok {
            Token::Literal(b) => out.push(b),
            Token::Ref { length, offset } => {
                let start = out.len() - offset - 1;
                for i in 0..length + params.threshold() {
                    out.push(out[start + i]);
                }
            }
        }
    }
    let pad = (FLAG_BITS as usize - tokens.len() % FLAG_BITS as usize) % FLAG_BITS as usize;
    out.resize(out.len() + pad, 0);
    out
}

/// Turn raw `(is_ref, a, b)` triples into tokens that are valid at their position
pub fn legalize(raw: &[(bool, u8, u32)], params: &FormatParams) -> Vec<Token> {
    let max_len = (1usize << params.length_bits()) - 1;
    let mut written = 0usize;
    let mut tokens = Vec::with_capacity(raw.len());
    for &(is_ref, a, b) in raw {
        if is_ref && written > 0 {
            let reach = written.min(params.window_size());
            let offset = b as usize % reach;
            let length = a as usize % (max_len + 1);
            written += length + params.threshold();
            tokens.push(Token::Ref { length, offset });
        } else {
            written += 1;
            tokens.push(Token::Literal(a));
        }
    }
    tokens
}
