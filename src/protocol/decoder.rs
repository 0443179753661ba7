// ==========================================
// 产线计数遥测采集核心 - 寄存器解码器
// ==========================================
// 职责: 寄存器字序列 → 无符号计数器值
// 字序: 低字在前 (ADAM 计数器寄存器布局: value = high * 65536 + low)
// ==========================================

use crate::protocol::error::{ProtocolError, ProtocolResult};

/// 将寄存器字序列解码为计数器原始值
///
/// # 参数
/// - words: 寄存器字 (1 字 = 16 位计数器, 2 字 = 32 位计数器, 低字在前)
/// - register_count: 通道配置的寄存器个数
///
/// # 返回
/// - Ok(u64): 原始计数值
/// - Err(WordCountMismatch): 字数与通道配置不符 (可重试故障类)
pub fn decode_counter(words: &[u16], register_count: u16) -> ProtocolResult<u64> {
    if words.len() != register_count as usize {
        return Err(ProtocolError::WordCountMismatch {
            expected: register_count as usize,
            actual: words.len(),
        });
    }

    match register_count {
        1 => Ok(u64::from(words[0])),
        2 => {
            let low = u64::from(words[0]);
            let high = u64::from(words[1]);
            Ok((high << 16) | low)
        }
        n => Err(ProtocolError::WordCountMismatch {
            expected: n as usize,
            actual: words.len(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_single_word() {
        assert_eq!(decode_counter(&[0xFFFF], 1).unwrap(), 65_535);
        assert_eq!(decode_counter(&[0], 1).unwrap(), 0);
    }

    #[test]
    fn test_decode_double_word_low_first() {
        // low=0x0001, high=0x0002 → 0x0002_0001
        assert_eq!(decode_counter(&[0x0001, 0x0002], 2).unwrap(), 0x0002_0001);
        assert_eq!(
            decode_counter(&[0xFFFF, 0xFFFF], 2).unwrap(),
            u64::from(u32::MAX)
        );
    }

    #[test]
    fn test_decode_word_count_mismatch() {
        let result = decode_counter(&[1, 2], 1);
        assert!(matches!(
            result,
            Err(ProtocolError::WordCountMismatch {
                expected: 1,
                actual: 2
            })
        ));
    }
}
