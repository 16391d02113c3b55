//! Сквозные сценарии сканера и драйвера реплея на настоящих flat-файлах:
//! переходы через границы файлов, конвенция подсчёта, повреждённый хвост.

use anyhow::Result;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use ChainRescue::consts::REC_HDR_SIZE;
use ChainRescue::store::{encode_record, BlockStore};
use ChainRescue::{
    replay, scan_blocks_dir, Network, RecoverError, ScanCursor, ScanStep, Scanner,
};

fn unique_root(prefix: &str) -> PathBuf {
    let pid = std::process::id();
    let t = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir().join(format!("chainrescue-{}-{}-{}", prefix, pid, t))
}

/// Синтетический блок с номером seq: валидный 80-байтовый заголовок,
/// tx_count=1, сырой хвост переменной длины (записи разной длины).
fn block_payload(seq: u32) -> Vec<u8> {
    let mut b = Vec::new();
    b.extend_from_slice(&2i32.to_le_bytes()); // version
    b.extend_from_slice(&[seq as u8; 32]); // prev_block
    b.extend_from_slice(&[0x33u8; 32]); // merkle_root
    b.extend_from_slice(&(1_700_000_000u32 + seq).to_le_bytes()); // time
    b.extend_from_slice(&0x1d00ffffu32.to_le_bytes()); // bits
    b.extend_from_slice(&seq.to_le_bytes()); // nonce
    b.push(1); // tx_count
    b.extend_from_slice(&vec![0x55u8; (seq % 5) as usize * 9]);
    b
}

/// Разложить записи по файлам: groups[i] — номера блоков файла i.
fn write_files(blocks_dir: &Path, groups: &[&[u32]]) -> Result<()> {
    fs::create_dir_all(blocks_dir)?;
    for (i, group) in groups.iter().enumerate() {
        let path = blocks_dir.join(format!("{:09}.fdb", i));
        let mut f = fs::File::create(path)?;
        for &seq in group.iter() {
            f.write_all(&encode_record(
                Network::Mainnet.magic(),
                &block_payload(seq),
            ))?;
        }
    }
    Ok(())
}

fn store_13(prefix: &str) -> Result<BlockStore> {
    let root = unique_root(prefix);
    write_files(
        &root,
        &[&[1, 2, 3, 4, 5], &[6, 7, 8, 9, 10], &[11, 12, 13]],
    )?;
    Ok(BlockStore::new(root, Network::Mainnet))
}

/// Адреса всех записей в порядке скана.
fn walk(store: &BlockStore) -> Result<(Vec<ChainRescue::BlockLocation>, ScanCursor)> {
    let mut locations = Vec::new();
    let mut sc = Scanner::new(store);
    loop {
        match sc.advance()? {
            ScanStep::End => break,
            ScanStep::Block { next, location, .. } => {
                locations.push(location);
                sc = next;
            }
        }
    }
    Ok((locations, sc.cursor))
}

#[test]
fn scanner_rolls_across_file_boundaries() -> Result<()> {
    let store = store_13("roll")?;
    let (locations, final_cursor) = walk(&store)?;

    assert_eq!(locations.len(), 13);

    // Распределение по файлам: 5 + 5 + 3.
    let file_nums: Vec<u32> = locations.iter().map(|l| l.file_num).collect();
    assert_eq!(&file_nums[..5], &[0; 5]);
    assert_eq!(&file_nums[5..10], &[1; 5]);
    assert_eq!(&file_nums[10..], &[2; 3]);

    // Смещения внутри файла стыкуются встык, первый в файле — с нуля.
    let mut expect_off = 0u32;
    let mut cur_file = 0u32;
    for l in &locations {
        if l.file_num != cur_file {
            cur_file = l.file_num;
            expect_off = 0;
        }
        assert_eq!(l.file_off, expect_off);
        expect_off += l.block_len;
    }

    // После последней записи курсор перекатился на несуществующий файл 3.
    assert_eq!(
        final_cursor,
        ScanCursor {
            file_num: 3,
            file_off: 0,
            file_len: 0
        }
    );

    // И следующий advance с этого места — End.
    match Scanner::with_cursor(&store, final_cursor).advance()? {
        ScanStep::End => {}
        ScanStep::Block { .. } => panic!("expected End past the last file"),
    }
    Ok(())
}

#[test]
fn replay_counts_attempts_after_genesis_skip() -> Result<()> {
    let store = store_13("count")?;
    let (locations, _) = walk(&store)?;

    let mut accepted = Vec::new();
    let blocks_read = replay(&store, |_, location| {
        accepted.push(location);
        Ok(())
    })?;

    // Конвенция: 13 записей => 13 попыток (12 блоков + завершающий End).
    assert_eq!(blocks_read, 13);
    assert_eq!(accepted.len(), 12);
    // Генезис (запись 1) пропущен: первым принят адрес записи 2.
    assert_eq!(accepted[0], locations[1]);
    assert_eq!(*accepted.last().unwrap(), locations[12]);
    Ok(())
}

#[test]
fn corrupt_record_7_stops_replay_successfully() -> Result<()> {
    let store = store_13("tail")?;
    let (locations, _) = walk(&store)?;

    // Портим payload записи 7 (вторая запись файла 1).
    let loc7 = locations[6];
    let path = store.file_path(loc7.file_num);
    let mut bytes = fs::read(&path)?;
    bytes[(loc7.file_off + REC_HDR_SIZE) as usize + 3] ^= 0xFF;
    fs::write(&path, bytes)?;

    let mut accepted = Vec::new();
    let blocks_read = replay(&store, |_, location| {
        accepted.push(location);
        Ok(())
    })?;

    // k=7 => blocks_read = 6; приняты только записи 2..6, к 8..13 не прикасались.
    assert_eq!(blocks_read, 6);
    assert_eq!(accepted.len(), 5);
    assert_eq!(*accepted.last().unwrap(), locations[5]);
    Ok(())
}

#[test]
fn corrupt_genesis_is_fatal() -> Result<()> {
    let store = store_13("genesis")?;
    let path = store.file_path(0);
    let mut bytes = fs::read(&path)?;
    bytes[(REC_HDR_SIZE + 1) as usize] ^= 0xFF;
    fs::write(&path, bytes)?;

    // Ошибка на пропуске генезиса не считается «потерей хвоста».
    let err = replay(&store, |_, _| Ok(())).unwrap_err();
    assert!(err.is_corruption());
    Ok(())
}

#[test]
fn short_payload_is_fatal_deserialize_error() -> Result<()> {
    let root = unique_root("deser");
    fs::create_dir_all(&root)?;
    let store = BlockStore::new(root, Network::Mainnet);

    // Записи 1-2 валидны, запись 3 структурно цела (CRC сходится),
    // но короче заголовка блока.
    let mut f = fs::File::create(store.file_path(0))?;
    f.write_all(&encode_record(Network::Mainnet.magic(), &block_payload(1)))?;
    f.write_all(&encode_record(Network::Mainnet.magic(), &block_payload(2)))?;
    f.write_all(&encode_record(Network::Mainnet.magic(), &[0u8; 40]))?;
    drop(f);

    let err = replay(&store, |_, _| Ok(())).unwrap_err();
    assert!(
        matches!(err, RecoverError::Deserialize { file_num: 0, .. }),
        "want Deserialize, got {err}"
    );
    Ok(())
}

#[test]
fn empty_store_and_unbound_scanner_end_immediately() -> Result<()> {
    let root = unique_root("empty");
    fs::create_dir_all(&root)?;
    let store = BlockStore::new(root, Network::Mainnet);

    match Scanner::new(&store).advance()? {
        ScanStep::End => {}
        ScanStep::Block { .. } => panic!("empty dir must yield End"),
    }
    assert_eq!(replay(&store, |_, _| Ok(()))?, 0);

    match Scanner::<BlockStore>::unbound().advance()? {
        ScanStep::End => {}
        ScanStep::Block { .. } => panic!("unbound scanner must yield End"),
    }
    Ok(())
}

#[test]
fn scan_stats_report() -> Result<()> {
    let store = store_13("stats")?;
    let stats = scan_blocks_dir(store.base(), Network::Mainnet)?;
    assert_eq!(stats.files, 3);
    assert_eq!(stats.blocks, 13);
    // Записи покрывают файлы целиком.
    let (_, total) = store.total_size()?;
    assert_eq!(stats.bytes, total);
    assert!(stats.tail_corruption.is_none());

    // После порчи записи 7 отчёт видит 6 записей и сообщение о хвосте.
    let (locations, _) = walk(&store)?;
    let loc7 = locations[6];
    let path = store.file_path(loc7.file_num);
    let mut bytes = fs::read(&path)?;
    bytes[(loc7.file_off + REC_HDR_SIZE) as usize] ^= 0xFF;
    fs::write(&path, bytes)?;

    let stats = scan_blocks_dir(store.base(), Network::Mainnet)?;
    assert_eq!(stats.blocks, 6);
    assert!(stats.tail_corruption.is_some());
    Ok(())
}
