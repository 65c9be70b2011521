//! Colour operator rewriting for content streams.

use lopdf::content::{Content, Operation};
use lopdf::Object;

/// Colour model of the active fill or stroke colour space, when it is one
/// this module converts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Converted {
    Rgb,
    Cmyk,
}

#[derive(Debug, Default)]
struct State {
    fill: Option<Converted>,
    stroke: Option<Converted>,
}

/// Rewrite every device colour operator of a decoded content stream to gray.
/// Returns the number of operators changed.
pub fn rewrite_content(content: &mut Content) -> usize {
    let mut state = State::default();
    let mut changed = 0;
    for op in content.operations.iter_mut() {
        if let Some(new_op) = rewrite_operation(op, &mut state) {
            *op = new_op;
            changed += 1;
        }
    }
    changed
}

fn rewrite_operation(op: &Operation, state: &mut State) -> Option<Operation> {
    match op.operator.as_str() {
        "rg" => Some(gray_op("g", rgb_luma(&op.operands)?)),
        "RG" => Some(gray_op("G", rgb_luma(&op.operands)?)),
        "k" => Some(gray_op("g", cmyk_luma(&op.operands)?)),
        "K" => Some(gray_op("G", cmyk_luma(&op.operands)?)),
        "cs" | "CS" => {
            let space = op.operands.first()?.as_name().ok()?;
            let converted = match space {
                b"DeviceRGB" => Some(Converted::Rgb),
                b"DeviceCMYK" => Some(Converted::Cmyk),
                _ => None,
            };
            if op.operator == "cs" {
                state.fill = converted;
            } else {
                state.stroke = converted;
            }
            converted.map(|_| Operation::new(&op.operator, vec![Object::Name(b"DeviceGray".to_vec())]))
        }
        "sc" | "scn" => convert_components(op, state.fill),
        "SC" | "SCN" => convert_components(op, state.stroke),
        _ => None,
    }
}

fn convert_components(op: &Operation, space: Option<Converted>) -> Option<Operation> {
    let gray = match space? {
        Converted::Rgb => rgb_luma(&op.operands)?,
        Converted::Cmyk => cmyk_luma(&op.operands)?,
    };
    Some(Operation::new(&op.operator, vec![Object::Real(gray)]))
}

fn gray_op(operator: &str, gray: f32) -> Operation {
    Operation::new(operator, vec![Object::Real(gray)])
}

fn numbers(operands: &[Object], n: usize) -> Option<Vec<f32>> {
    if operands.len() != n {
        return None;
    }
    operands
        .iter()
        .map(|o| match o {
            Object::Integer(i) => Some(*i as f32),
            Object::Real(r) => Some(*r as f32),
            _ => None,
        })
        .collect()
}

/// ITU-R BT.601 luma.
pub fn luma(r: f32, g: f32, b: f32) -> f32 {
    (0.299 * r + 0.587 * g + 0.114 * b).clamp(0.0, 1.0)
}

fn rgb_luma(operands: &[Object]) -> Option<f32> {
    let v = numbers(operands, 3)?;
    Some(round3(luma(v[0], v[1], v[2])))
}

fn cmyk_luma(operands: &[Object]) -> Option<f32> {
    let v = numbers(operands, 4)?;
    let gray = 1.0 - (0.3 * v[0] + 0.59 * v[1] + 0.11 * v[2] + v[3]).min(1.0);
    Some(round3(gray.clamp(0.0, 1.0)))
}

fn round3(v: f32) -> f32 {
    (v * 1000.0).round() / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ops(content: &Content) -> Vec<&str> {
        content.operations.iter().map(|o| o.operator.as_str()).collect()
    }

    #[test]
    fn test_rgb_and_cmyk_become_gray() {
        let mut content = Content {
            operations: vec![
                Operation::new("rg", vec![1.into(), 0.into(), 0.into()]),
                Operation::new("RG", vec![0.into(), 1.into(), 0.into()]),
                Operation::new("k", vec![0.into(), 0.into(), 0.into(), 1.into()]),
                Operation::new("re", vec![0.into(), 0.into(), 10.into(), 10.into()]),
                Operation::new("f", vec![]),
            ],
        };
        assert_eq!(rewrite_content(&mut content), 3);
        assert_eq!(ops(&content), vec!["g", "G", "g", "re", "f"]);
        assert_eq!(content.operations[0].operands[0].as_float().unwrap(), 0.299);
        assert_eq!(content.operations[2].operands[0].as_float().unwrap(), 0.0);
    }

    #[test]
    fn test_color_space_tracking() {
        let mut content = Content {
            operations: vec![
                Operation::new("cs", vec![Object::Name(b"DeviceRGB".to_vec())]),
                Operation::new("sc", vec![0.into(), 0.into(), 1.into()]),
                Operation::new("cs", vec![Object::Name(b"Pattern".to_vec())]),
                Operation::new("scn", vec![Object::Name(b"P0".to_vec())]),
            ],
        };
        assert_eq!(rewrite_content(&mut content), 2);
        assert_eq!(
            content.operations[0].operands[0].as_name().unwrap(),
            b"DeviceGray"
        );
        assert_eq!(content.operations[1].operands[0].as_float().unwrap(), 0.114);
        assert_eq!(content.operations[3].operator, "scn");
        assert_eq!(content.operations[3].operands.len(), 1);
    }

    #[test]
    fn test_malformed_operands_untouched() {
        let mut content = Content {
            operations: vec![Operation::new("rg", vec![1.into()])],
        };
        assert_eq!(rewrite_content(&mut content), 0);
        assert_eq!(ops(&content), vec!["rg"]);
    }
}
