use super::RandomSource;

/// 兑奖码字节数 (64 bit 熵, 16 位十六进制)
pub const CLAIM_CODE_BYTES: usize = 8;

/// 生成兑奖码：随机字节渲染为小写十六进制
pub fn generate_claim_code(rng: &dyn RandomSource) -> String {
    let mut bytes = [0u8; CLAIM_CODE_BYTES];
    rng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}
