//! Общие константы форматов (flat-файлы, каталоги восстановления).

// -------- Flat-файлы с блоками --------
// Имена файлов: девятизначный номер + расширение, например "000000042.fdb".
pub const BLOCK_FILE_EXT: &str = "fdb";

// Формат записи в flat-файле:
// [network u32 LE][payload_len u32 LE][payload][crc32c u32 BE]
//
// CRC-32C (Castagnoli) считается по всему, что до трейлера.
// Полный размер записи = payload_len + REC_OVERHEAD.
pub const REC_HDR_SIZE: u32 = 8;
pub const REC_TRAILER_SIZE: u32 = 4;
pub const REC_OVERHEAD: u32 = REC_HDR_SIZE + REC_TRAILER_SIZE; // 12

// Сериализованный заголовок блока (version + prev + merkle + time + bits + nonce).
pub const BLOCK_HDR_SIZE: usize = 80;

// -------- Каталоги --------
// {base}/{network}/          — живая БД
// {base}/recovery/{network}/ — staging во время восстановления
// .../blocks/                — flat-файлы внутри каждой БД
pub const RECOVERY_DIR: &str = "recovery";
pub const BLOCKS_DIR: &str = "blocks";

// Advisory-lock на base на время восстановления.
pub const LOCK_FILE: &str = "LOCK";
