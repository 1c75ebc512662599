//! 16비트 1의 보수 체크섬
//!
//! 입력 워드 순서: 시퀀스 하위 16비트, 시퀀스 상위 16비트, 패킷 타입,
//! 페이로드 (리틀엔디언 16비트 쌍, 홀수 길이면 마지막 바이트를 0과 짝지음)

/// 캐리 순환 덧셈
///
/// 캐리가 남지 않을 때까지 상위 비트를 하위로 되돌린다.
fn wrap_around(a: u32, b: u32) -> u32 {
    let mut sum = a + b;
    while sum >> 16 != 0 {
        sum = (sum & 0xffff) + (sum >> 16);
    }
    sum
}

/// 체크섬 누산기
#[derive(Debug, Clone, Copy, Default)]
pub struct Checksum {
    sum: u32,
}

impl Checksum {
    pub fn new() -> Self {
        Self::default()
    }

    /// 16비트 워드 추가
    pub fn add_word(&mut self, word: u16) -> &mut Self {
        self.sum = wrap_around(self.sum, u32::from(word));
        self
    }

    /// 32비트 시퀀스 번호 추가 (하위, 상위 순)
    pub fn add_sequence(&mut self, sequence: u32) -> &mut Self {
        self.add_word((sequence & 0xffff) as u16)
            .add_word((sequence >> 16) as u16)
    }

    /// 페이로드 추가
    pub fn add_payload(&mut self, payload: &[u8]) -> &mut Self {
        for pair in payload.chunks(2) {
            let low = u16::from(pair[0]);
            let high = pair.get(1).copied().map_or(0, u16::from);
            self.add_word(low | (high << 8));
        }
        self
    }

    /// 누적 합 (보수 적용 전)
    pub fn sum(&self) -> u16 {
        self.sum as u16
    }
}

/// 전송용 체크섬 계산
pub fn compute(sequence: u32, indicator: u16, payload: &[u8]) -> u16 {
    let sum = Checksum::new()
        .add_sequence(sequence)
        .add_word(indicator)
        .add_payload(payload)
        .sum();
    !sum
}

/// 수신 체크섬 검증
///
/// 수신한 체크섬 값까지 포함해 합산하면 정상 세그먼트는 `0xffff`가 된다.
pub fn verify(sequence: u32, checksum: u16, indicator: u16, payload: &[u8]) -> bool {
    let sum = Checksum::new()
        .add_sequence(sequence)
        .add_word(checksum)
        .add_word(indicator)
        .add_payload(payload)
        .sum();
    sum == 0xffff
}
