use std::net::SocketAddr;
use std::time::Duration;

use matmul_comm::{ConnectOptions, Error, LocalGroup, TcpGroup, TcpTransport, Transport};
use tokio::time::timeout;

const LIMIT: Duration = Duration::from_secs(10);

async fn tcp_group(size: usize) -> Vec<TcpTransport> {
    let mut listeners = Vec::new();
    for _ in 0..size {
        listeners.push(TcpGroup::bind("127.0.0.1:0").await.unwrap());
    }
    let peers: Vec<SocketAddr> = listeners.iter().map(|l| l.local_addr().unwrap()).collect();

    let mut handles = Vec::new();
    for (rank, listener) in listeners.into_iter().enumerate() {
        let peers = peers.clone();
        handles.push(tokio::spawn(async move {
            listener
                .join(rank, &peers, &ConnectOptions::default())
                .await
        }));
    }

    let mut group = Vec::new();
    for handle in handles {
        group.push(handle.await.unwrap().unwrap());
    }
    group
}

async fn broadcast_everywhere<T: Transport + 'static>(group: Vec<T>) {
    let mut handles = Vec::new();
    for transport in group {
        handles.push(tokio::spawn(async move {
            let mut buf = if transport.rank() == 0 {
                vec![10, 20, 30, 40]
            } else {
                vec![0; 4]
            };
            transport.broadcast(0, &mut buf).await.map(|_| buf)
        }));
    }
    for handle in handles {
        let buf = timeout(LIMIT, handle).await.unwrap().unwrap().unwrap();
        assert_eq!(buf, vec![10, 20, 30, 40]);
    }
}

#[tokio::test]
async fn local_broadcast_reaches_every_rank() {
    broadcast_everywhere(LocalGroup::new(4)).await;
}

#[tokio::test]
async fn tcp_broadcast_reaches_every_rank() {
    broadcast_everywhere(tcp_group(3).await).await;
}

#[tokio::test]
async fn broadcast_waits_for_every_rank() {
    let mut group = LocalGroup::new(3).into_iter();
    let root = group.next().unwrap();
    let early = group.next().unwrap();
    let late = group.next().unwrap();

    let root_task = tokio::spawn(async move {
        let mut buf = vec![1, 2];
        root.broadcast(0, &mut buf).await
    });
    let early_task = tokio::spawn(async move {
        let mut buf = vec![0, 0];
        early.broadcast(0, &mut buf).await
    });

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(!root_task.is_finished());
    assert!(!early_task.is_finished());

    let mut buf = vec![0, 0];
    late.broadcast(0, &mut buf).await.unwrap();
    timeout(LIMIT, root_task).await.unwrap().unwrap().unwrap();
    timeout(LIMIT, early_task).await.unwrap().unwrap().unwrap();
}

#[tokio::test]
async fn tcp_point_to_point_keeps_order() {
    let group = tcp_group(2).await;
    for i in 0..5 {
        group[1].send(0, 9, vec![i]).await.unwrap();
    }
    for i in 0..5 {
        assert_eq!(group[0].recv(1, 9, 1).await.unwrap(), vec![i]);
    }
}

#[tokio::test]
async fn tcp_abort_fails_remote_receive() {
    let mut group = tcp_group(3).await.into_iter();
    let root = group.next().unwrap();
    let first = group.next().unwrap();
    let second = group.next().unwrap();

    let waiting = tokio::spawn(async move { root.recv(1, 7, 1).await });
    second.abort(5).await;

    let err = timeout(LIMIT, waiting).await.unwrap().unwrap().unwrap_err();
    assert!(matches!(err, Error::Aborted { code: 5 }));
    drop(first);
}

#[tokio::test]
async fn tcp_closed_peer_fails_receive() {
    let mut group = tcp_group(2).await.into_iter();
    let root = group.next().unwrap();
    let worker = group.next().unwrap();

    worker.send(0, 4, vec![1, 2]).await.unwrap();
    drop(worker);

    assert_eq!(root.recv(1, 4, 2).await.unwrap(), vec![1, 2]);
    let err = timeout(LIMIT, root.recv(1, 4, 2)).await.unwrap().unwrap_err();
    assert!(matches!(err, Error::Disconnected(1)));
}

#[tokio::test]
async fn broadcast_rejects_mismatched_buffer() {
    let mut group = LocalGroup::new(2).into_iter();
    let root = group.next().unwrap();
    let worker = group.next().unwrap();

    let root_task = tokio::spawn(async move {
        let mut buf = vec![1, 2, 3, 4];
        root.broadcast(0, &mut buf).await
    });

    let mut short = vec![0; 3];
    let err = timeout(LIMIT, worker.broadcast(0, &mut short))
        .await
        .unwrap()
        .unwrap_err();
    assert!(matches!(
        err,
        Error::LengthMismatch {
            src: 0,
            tag: matmul_types::tag::BROADCAST,
            expected: 3,
            actual: 4,
        }
    ));
    assert_eq!(short, vec![0, 0, 0]);

    // the root is stuck in the barrier until the group is torn down
    worker.abort(3).await;
    let err = timeout(LIMIT, root_task).await.unwrap().unwrap().unwrap_err();
    assert!(matches!(err, Error::Aborted { code: 3 }));
}
