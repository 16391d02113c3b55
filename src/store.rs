//! store — раскладка flat-файлов и read-примитив записей.
//!
//! Никакому индексу здесь доверять нельзя (он и есть то, что чинится):
//! единственные источники истины — stat файла и сырое чтение. Отсутствие
//! файла с очередным номером — это штатный сигнал конца данных, а не ошибка,
//! поэтому file_len возвращает Option, а не Err.
//!
//! Формат записи (см. consts):
//! [network u32 LE][payload_len u32 LE][payload][crc32c u32 BE]
//!
//! Структурное повреждение (RecoverError::Corruption) — это:
//! - заголовок или payload записи вылезают за конец файла;
//! - network magic не совпадает;
//! - CRC-32C не сходится;
//! - запрошенная проверка хеша не прошла (или payload короче заголовка блока).
//!
//! Проверка хеша — явная опция read-примитива: None означает «проверка не
//! запрошена», никаких нулевых хеш-сентинелей.

use byteorder::{BigEndian, ByteOrder, LittleEndian};
use sha2::{Digest, Sha256};
use std::fs;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use crate::block::BlockHash;
use crate::consts::{BLOCK_FILE_EXT, BLOCK_HDR_SIZE, REC_HDR_SIZE, REC_OVERHEAD};
use crate::errors::RecoverError;
use crate::net::Network;

/// Адрес одной записи блока в последовательности flat-файлов.
/// block_len включает 12 байт обвязки записи (заголовок + CRC-трейлер).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockLocation {
    pub file_num: u32,
    pub file_off: u32,
    pub block_len: u32,
}

/// Инжектируемая способность чтения для сканера.
/// Отделяет чистый переход курсора от файловой системы (и даёт тестам
/// подменять хранилище).
pub trait RecordSource {
    /// Длина файла с данным номером; None — файла нет (конец данных).
    fn file_len(&self, file_num: u32) -> Result<Option<u64>, RecoverError>;

    /// Прочитать запись по (file_num, file_off) и вернуть payload без обвязки.
    /// expected: Some(h) — дополнительно сверить хеш блока; None — проверка
    /// не запрошена.
    fn read_record(
        &self,
        file_num: u32,
        file_off: u32,
        expected: Option<&BlockHash>,
    ) -> Result<Vec<u8>, RecoverError>;
}

pub struct BlockStore {
    base: PathBuf,
    net_magic: u32,
}

impl BlockStore {
    pub fn new(blocks_dir: PathBuf, network: Network) -> Self {
        Self {
            base: blocks_dir,
            net_magic: network.magic(),
        }
    }

    /// Путь flat-файла по номеру: {base}/{:09}.fdb. Чистая и тотальная.
    pub fn file_path(&self, file_num: u32) -> PathBuf {
        self.base.join(format!("{:09}.{}", file_num, BLOCK_FILE_EXT))
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    /// Пройтись stat-ом по файлам 0.. до первого отсутствующего.
    /// Возвращает (число файлов, суммарный размер в байтах).
    pub fn total_size(&self) -> Result<(u32, u64), RecoverError> {
        let mut files = 0u32;
        let mut bytes = 0u64;
        loop {
            match fs::metadata(self.file_path(files)) {
                Ok(md) => {
                    bytes += md.len();
                    files += 1;
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => break,
                Err(e) => return Err(e.into()),
            }
        }
        Ok((files, bytes))
    }

    fn corrupt(&self, file_num: u32, file_off: u32, reason: impl Into<String>) -> RecoverError {
        RecoverError::Corruption {
            file_num,
            file_off,
            reason: reason.into(),
        }
    }
}

impl RecordSource for BlockStore {
    fn file_len(&self, file_num: u32) -> Result<Option<u64>, RecoverError> {
        match fs::metadata(self.file_path(file_num)) {
            Ok(md) => Ok(Some(md.len())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn read_record(
        &self,
        file_num: u32,
        file_off: u32,
        expected: Option<&BlockHash>,
    ) -> Result<Vec<u8>, RecoverError> {
        let path = self.file_path(file_num);
        let mut f = match fs::File::open(&path) {
            Ok(f) => f,
            // Пропавший посреди скана файл — настоящий NotFound, не конец данных:
            // конец данных сигналится только пробой file_len.
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(RecoverError::NotFound(path))
            }
            Err(e) => return Err(e.into()),
        };
        let flen = f.metadata()?.len();

        if u64::from(file_off) + u64::from(REC_OVERHEAD) > flen {
            return Err(self.corrupt(file_num, file_off, "record frame past end of file"));
        }

        let mut hdr = [0u8; REC_HDR_SIZE as usize];
        f.seek(SeekFrom::Start(u64::from(file_off)))?;
        f.read_exact(&mut hdr)?;

        let net = LittleEndian::read_u32(&hdr[0..4]);
        if net != self.net_magic {
            return Err(self.corrupt(
                file_num,
                file_off,
                format!("bad network magic 0x{:08x}", net),
            ));
        }

        let payload_len = LittleEndian::read_u32(&hdr[4..8]);
        let rec_end = u64::from(file_off) + u64::from(payload_len) + u64::from(REC_OVERHEAD);
        if rec_end > flen {
            return Err(self.corrupt(
                file_num,
                file_off,
                format!("record of {} bytes overruns file", payload_len),
            ));
        }

        let mut payload = vec![0u8; payload_len as usize];
        f.read_exact(&mut payload)?;
        let mut trailer = [0u8; 4];
        f.read_exact(&mut trailer)?;

        let stored = BigEndian::read_u32(&trailer);
        let calc = crc32c::crc32c_append(crc32c::crc32c(&hdr), &payload);
        if stored != calc {
            return Err(self.corrupt(
                file_num,
                file_off,
                format!("checksum mismatch: stored 0x{:08x}, calc 0x{:08x}", stored, calc),
            ));
        }

        if let Some(want) = expected {
            if payload.len() < BLOCK_HDR_SIZE {
                return Err(self.corrupt(file_num, file_off, "payload too short for hash check"));
            }
            let got = Sha256::digest(Sha256::digest(&payload[..BLOCK_HDR_SIZE]));
            if got.as_slice() != want {
                return Err(self.corrupt(file_num, file_off, "block hash mismatch"));
            }
        }

        Ok(payload)
    }
}

/// Закодировать одну запись flat-файла (обвязка + CRC вокруг payload).
/// Используется тестами и офлайн-инструментами подготовки фикстур;
/// сам процесс восстановления flat-файлы никогда не пишет.
pub fn encode_record(net_magic: u32, payload: &[u8]) -> Vec<u8> {
    let mut rec = Vec::with_capacity(payload.len() + REC_OVERHEAD as usize);
    let mut hdr = [0u8; REC_HDR_SIZE as usize];
    LittleEndian::write_u32(&mut hdr[0..4], net_magic);
    LittleEndian::write_u32(&mut hdr[4..8], payload.len() as u32);
    rec.extend_from_slice(&hdr);
    rec.extend_from_slice(payload);
    let crc = crc32c::crc32c_append(crc32c::crc32c(&hdr), payload);
    let mut trailer = [0u8; 4];
    BigEndian::write_u32(&mut trailer, crc);
    rec.extend_from_slice(&trailer);
    rec
}
