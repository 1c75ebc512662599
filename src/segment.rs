//! 데이터 세그먼트 정의
//!
//! - Segment: 8바이트 헤더 + 페이로드 (최대 MSS - 8 바이트)
//! - SegmentBuilder: 파일을 MSS 단위 세그먼트로 분할 (송신측)
//!
//! ```text
//! 0                      16                      32
//! +-----------------------------------------------+
//! |                Sequence Number                |
//! +-----------------------+-----------------------+
//! |        Checksum       |     Type Indicator    |
//! +-----------------------+-----------------------+
//! |                    Payload                    |
//! +-----------------------------------------------+
//! ```
//!
//! 모든 정수는 빅엔디언

use bytes::{Buf, BufMut, Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::message::PacketType;
use crate::{advance_sequence, checksum, Error, Result, HEADER_SIZE};

/// 세그먼트 헤더
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentHeader {
    /// 파일 내 페이로드 바이트 오프셋
    pub sequence: u32,

    /// 1의 보수 체크섬
    pub checksum: u16,

    /// DATA / LAST_DATA
    pub packet_type: PacketType,
}

/// 데이터 세그먼트 (송신 패킷 단위)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub header: SegmentHeader,

    pub payload: Bytes,
}

impl Segment {
    /// 새 세그먼트 생성 (체크섬 계산 포함)
    pub fn new(sequence: u32, packet_type: PacketType, payload: Bytes) -> Self {
        let checksum = checksum::compute(sequence, packet_type.as_u16(), &payload);
        Self {
            header: SegmentHeader {
                sequence,
                checksum,
                packet_type,
            },
            payload,
        }
    }

    /// 세그먼트를 바이트로 직렬화
    pub fn to_bytes(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(HEADER_SIZE + self.payload.len());
        buf.put_u32(self.header.sequence);
        buf.put_u16(self.header.checksum);
        buf.put_u16(self.header.packet_type.as_u16());
        buf.extend_from_slice(&self.payload);
        buf.freeze()
    }

    /// 바이트에서 세그먼트 역직렬화
    ///
    /// 체크섬은 검증하지 않는다. [`Segment::verify_checksum`] 참고.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_SIZE {
            return Err(Error::PacketTooShort { len: bytes.len() });
        }

        let mut header = &bytes[..HEADER_SIZE];
        let sequence = header.get_u32();
        let checksum = header.get_u16();
        let packet_type = PacketType::data_from_u16(header.get_u16())?;

        Ok(Self {
            header: SegmentHeader {
                sequence,
                checksum,
                packet_type,
            },
            payload: Bytes::copy_from_slice(&bytes[HEADER_SIZE..]),
        })
    }

    /// 체크섬 검증
    pub fn verify_checksum(&self) -> bool {
        checksum::verify(
            self.header.sequence,
            self.header.checksum,
            self.header.packet_type.as_u16(),
            &self.payload,
        )
    }

    pub fn is_last(&self) -> bool {
        self.header.packet_type.is_last()
    }

    /// 헤더 포함 전체 길이
    pub fn wire_len(&self) -> usize {
        HEADER_SIZE + self.payload.len()
    }
}

/// 세그먼트 생성기 (송신측)
///
/// 입력을 `mss - 8` 바이트씩 순차적으로 읽는다. 다음 청크를 미리 읽어
/// 마지막 세그먼트에만 LAST_DATA 표시를 붙인다.
pub struct SegmentBuilder<R> {
    reader: R,
    mss: usize,
    next_sequence: u32,
    lookahead: Option<Bytes>,
    finished: bool,
}

impl<R: AsyncRead + Unpin> SegmentBuilder<R> {
    pub fn new(reader: R, mss: usize) -> Self {
        debug_assert!(mss > HEADER_SIZE);
        Self {
            reader,
            mss,
            next_sequence: 0,
            lookahead: None,
            finished: false,
        }
    }

    /// 세그먼트당 페이로드 크기
    pub fn payload_size(&self) -> usize {
        self.mss - HEADER_SIZE
    }

    /// 다음에 생성될 세그먼트의 시퀀스 번호
    pub fn next_sequence(&self) -> u32 {
        self.next_sequence
    }

    /// 다음 세그먼트 생성
    ///
    /// 빈 입력은 빈 LAST_DATA 세그먼트 하나를 만든다.
    pub async fn next_segment(&mut self) -> Result<Option<Segment>> {
        if self.finished {
            return Ok(None);
        }

        let current = match self.lookahead.take() {
            Some(chunk) => chunk,
            None => self.read_chunk().await?,
        };

        let next = if current.len() < self.payload_size() {
            Bytes::new()
        } else {
            self.read_chunk().await?
        };

        let packet_type = if next.is_empty() {
            self.finished = true;
            PacketType::LastData
        } else {
            self.lookahead = Some(next);
            PacketType::Data
        };

        let segment = Segment::new(self.next_sequence, packet_type, current);
        // 마지막 청크 길이와 상관없이 MSS만큼 증가
        self.next_sequence = advance_sequence(self.next_sequence, self.mss);

        Ok(Some(segment))
    }

    async fn read_chunk(&mut self) -> Result<Bytes> {
        let limit = self.payload_size();
        let mut buf = Vec::with_capacity(limit);
        (&mut self.reader)
            .take(limit as u64)
            .read_to_end(&mut buf)
            .await?;
        Ok(Bytes::from(buf))
    }
}
