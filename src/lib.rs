#![allow(non_snake_case)]

// Базовые модули
pub mod consts;
pub mod errors;
pub mod net;

// Формат блока и чтение flat-файлов
pub mod block;
pub mod store;

// Сканер и драйвер реплея
pub mod scan;
pub mod replay;

// Каталоги восстановления, прогресс, lock
pub mod lock;
pub mod progress;
pub mod staging;

// Верхний уровень: recover_database / scan_blocks_dir
pub mod recover;

// Удобные реэкспорты
pub use block::{Block, BlockHash, BlockHeader};
pub use errors::RecoverError;
pub use net::Network;
pub use recover::{recover_database, scan_blocks_dir, ScanStats};
pub use replay::replay;
pub use scan::{ScanCursor, ScanStep, Scanner};
pub use store::{BlockLocation, BlockStore, RecordSource};
