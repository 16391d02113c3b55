//! Минимальная десериализация блока из сырых байт записи flat-файла.
//!
//! Разбирается только то, что нужно восстановлению индекса:
//! - 80-байтовый заголовок (version, prev_block, merkle_root, time, bits, nonce);
//! - CompactSize-счётчик транзакций;
//! - остаток буфера сохраняется как сырой регион транзакций (полный wire-разбор
//!   транзакций — дело внешнего валидатора, не наше).
//!
//! Хеш блока — double-SHA256 по первым 80 байтам сериализации, в порядке
//! байт «как на диске» (little-endian отображение развёрнуто).

use anyhow::{anyhow, Result};
use byteorder::{ByteOrder, LittleEndian};
use sha2::{Digest, Sha256};

use crate::consts::BLOCK_HDR_SIZE;

pub type BlockHash = [u8; 32];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockHeader {
    pub version: i32,
    pub prev_block: BlockHash,
    pub merkle_root: BlockHash,
    pub timestamp: u32,
    pub bits: u32,
    pub nonce: u32,
}

#[derive(Debug, Clone)]
pub struct Block {
    pub header: BlockHeader,
    pub tx_count: u64,
    raw: Vec<u8>,
}

impl Block {
    /// Разобрать сырые байты записи (payload без 12-байтовой обвязки).
    ///
    /// Ошибка здесь означает несовпадение формата, а не повреждение диска:
    /// структурные проверки (CRC, границы) уже пройдены в read-примитиве.
    pub fn deserialize(bytes: &[u8]) -> Result<Block> {
        if bytes.len() < BLOCK_HDR_SIZE {
            return Err(anyhow!(
                "short block: {} bytes, header needs {}",
                bytes.len(),
                BLOCK_HDR_SIZE
            ));
        }

        let mut prev_block = [0u8; 32];
        prev_block.copy_from_slice(&bytes[4..36]);
        let mut merkle_root = [0u8; 32];
        merkle_root.copy_from_slice(&bytes[36..68]);

        let header = BlockHeader {
            version: LittleEndian::read_i32(&bytes[0..4]),
            prev_block,
            merkle_root,
            timestamp: LittleEndian::read_u32(&bytes[68..72]),
            bits: LittleEndian::read_u32(&bytes[72..76]),
            nonce: LittleEndian::read_u32(&bytes[76..80]),
        };

        let (tx_count, _) = read_compact_size(&bytes[BLOCK_HDR_SIZE..])?;

        Ok(Block {
            header,
            tx_count,
            raw: bytes.to_vec(),
        })
    }

    /// double-SHA256 по 80-байтовому заголовку (байтовый порядок как на диске).
    pub fn block_hash(&self) -> BlockHash {
        let first = Sha256::digest(&self.raw[..BLOCK_HDR_SIZE]);
        let second = Sha256::digest(first);
        let mut out = [0u8; 32];
        out.copy_from_slice(&second);
        out
    }

    /// Полная сериализация блока (как лежит в записи).
    pub fn raw(&self) -> &[u8] {
        &self.raw
    }
}

/// CompactSize: [n u8] | [0xfd][n u16 LE] | [0xfe][n u32 LE] | [0xff][n u64 LE].
/// Возвращает (значение, сколько байт занял префикс).
fn read_compact_size(bytes: &[u8]) -> Result<(u64, usize)> {
    let tag = *bytes
        .first()
        .ok_or_else(|| anyhow!("truncated tx count"))?;
    let need = match tag {
        0xfd => 2usize,
        0xfe => 4,
        0xff => 8,
        n => return Ok((n as u64, 1)),
    };
    if bytes.len() < 1 + need {
        return Err(anyhow!("truncated tx count (tag 0x{:02x})", tag));
    }
    let v = match need {
        2 => LittleEndian::read_u16(&bytes[1..3]) as u64,
        4 => LittleEndian::read_u32(&bytes[1..5]) as u64,
        _ => LittleEndian::read_u64(&bytes[1..9]),
    };
    Ok((v, 1 + need))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unhex(s: &str) -> Vec<u8> {
        (0..s.len())
            .step_by(2)
            .map(|i| u8::from_str_radix(&s[i..i + 2], 16).unwrap())
            .collect()
    }

    // Заголовок генезиса mainnet, собранный по полям.
    fn genesis_header_bytes() -> Vec<u8> {
        let mut b = Vec::with_capacity(80);
        b.extend_from_slice(&1i32.to_le_bytes()); // version
        b.extend_from_slice(&[0u8; 32]); // prev_block
        b.extend_from_slice(&unhex(
            "3ba3edfd7a7b12b27ac72c3e67768f617fc81bc3888a51323a9fb8aa4b1e5e4a",
        )); // merkle_root
        b.extend_from_slice(&1231006505u32.to_le_bytes()); // time
        b.extend_from_slice(&0x1d00ffffu32.to_le_bytes()); // bits
        b.extend_from_slice(&2083236893u32.to_le_bytes()); // nonce
        b
    }

    #[test]
    fn deserialize_and_hash_genesis() {
        let mut raw = genesis_header_bytes();
        raw.push(1); // tx_count = 1, сами транзакции не разбираем
        raw.extend_from_slice(&[0xAB; 16]); // произвольный сырой хвост

        let blk = Block::deserialize(&raw).unwrap();
        assert_eq!(blk.header.version, 1);
        assert_eq!(blk.header.prev_block, [0u8; 32]);
        assert_eq!(blk.header.timestamp, 1231006505);
        assert_eq!(blk.tx_count, 1);

        // Известный хеш генезиса (байтовый порядок как на диске).
        let want = unhex("6fe28c0ab6f1b372c1a6a246ae63f74f931e8365e15a089c68d6190000000000");
        assert_eq!(blk.block_hash().to_vec(), want);
    }

    #[test]
    fn short_buffer_fails() {
        let err = Block::deserialize(&[0u8; 79]).unwrap_err();
        assert!(err.to_string().contains("short block"));
    }

    #[test]
    fn truncated_tx_count_fails() {
        // Ровно 80 байт: заголовок есть, счётчика транзакций нет.
        let raw = genesis_header_bytes();
        assert!(Block::deserialize(&raw).is_err());
    }

    #[test]
    fn wide_compact_size() {
        let mut raw = genesis_header_bytes();
        raw.push(0xfd);
        raw.extend_from_slice(&300u16.to_le_bytes());
        let blk = Block::deserialize(&raw).unwrap();
        assert_eq!(blk.tx_count, 300);

        // Обрезанный широкий префикс — ошибка.
        let mut bad = genesis_header_bytes();
        bad.push(0xfe);
        bad.push(0x01);
        assert!(Block::deserialize(&bad).is_err());
    }
}
