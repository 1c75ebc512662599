//! 패킷 타입과 ACK 메시지 정의
//!
//! ACK는 체크섬 없이 고정 8바이트
//!
//! ```text
//! 0                      16                      32
//! +-----------------------------------------------+
//! |             ACKed Sequence Number             |
//! +-----------------------+-----------------------+
//! |        0x0000         |     ACK Indicator     |
//! +-----------------------+-----------------------+
//! ```

use bytes::{Buf, BufMut, BytesMut};

use crate::{Error, Result, ACK_SIZE};

/// 패킷 타입 표시자 (헤더 6..8 바이트)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum PacketType {
    /// 데이터 세그먼트
    Data = 0x5555,

    /// 마지막 데이터 세그먼트
    LastData = 0x5557,

    /// ACK
    Ack = 0xAAAA,
}

impl PacketType {
    /// 데이터 세그먼트 표시자 해석
    ///
    /// DATA / LAST_DATA 외의 값은 에러
    pub fn data_from_u16(value: u16) -> Result<Self> {
        match value {
            v if v == Self::Data as u16 => Ok(Self::Data),
            v if v == Self::LastData as u16 => Ok(Self::LastData),
            other => Err(Error::UnknownIndicator(other)),
        }
    }

    pub fn as_u16(self) -> u16 {
        self as u16
    }

    pub fn is_last(self) -> bool {
        self == Self::LastData
    }
}

/// ACK 메시지 (수신자 → 송신자)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ack {
    /// 확인된 시퀀스 번호
    pub acked_sequence: u32,

    /// 예약 필드 (항상 0)
    pub reserved: u16,

    /// ACK 표시자
    pub indicator: u16,
}

impl Ack {
    pub fn new(acked_sequence: u32) -> Self {
        Self {
            acked_sequence,
            reserved: 0,
            indicator: PacketType::Ack.as_u16(),
        }
    }

    /// 바이트로 직렬화
    pub fn to_bytes(&self) -> [u8; ACK_SIZE] {
        let mut buf = BytesMut::with_capacity(ACK_SIZE);
        buf.put_u32(self.acked_sequence);
        buf.put_u16(self.reserved);
        buf.put_u16(self.indicator);

        let mut out = [0u8; ACK_SIZE];
        out.copy_from_slice(&buf);
        out
    }

    /// 바이트에서 역직렬화
    ///
    /// 필드 값은 검사하지 않는다. 검사는 [`Ack::confirms`] 참고.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != ACK_SIZE {
            return Err(Error::InvalidAck);
        }

        let mut buf = bytes;
        Ok(Self {
            acked_sequence: buf.get_u32(),
            reserved: buf.get_u16(),
            indicator: buf.get_u16(),
        })
    }

    /// 이 ACK가 `sequence`를 확인하는지 여부
    pub fn confirms(&self, sequence: u32) -> bool {
        self.acked_sequence == sequence
            && self.reserved == 0
            && self.indicator == PacketType::Ack.as_u16()
    }
}
